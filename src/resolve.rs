//! Entity resolution: classification plus kind-specific lookup cascades.
//!
//! Every cascade is a named pipeline selected by [`EntityKind`]; each stage
//! awaits the store sequentially because its parameters come from the
//! previous stage's result. A stage that finds nothing appends an empty
//! placeholder section and the cascade continues; a store fault abandons
//! the remainder of the cascade and surfaces to the caller.

use navigator_common::is_safe_identifier;

use crate::error::ApiError;
use crate::ledger;
use crate::model::{AddressSummary, CompositeRecord, EntityKind, Transactions};
use crate::store::ExplorerDb;

/// Resolves an identifier into its composite record.
///
/// An identifier the store does not know yields an empty record, not an
/// error; an identifier that fails validation is rejected before any
/// query runs.
pub async fn resolve_identifier(
    db: &ExplorerDb,
    identifier: &str,
) -> Result<CompositeRecord, ApiError> {
    if !is_safe_identifier(identifier) {
        return Err(ApiError::ValidationRejected);
    }

    let mut record = CompositeRecord::new();

    let Some(classification) = db.classification(identifier).await? else {
        return Ok(record);
    };

    let kind = classification.kind();
    record.push(&classification);

    match kind {
        EntityKind::Address => resolve_address(db, identifier, &mut record).await?,
        EntityKind::Block => resolve_block(db, &classification.master_hash, &mut record).await?,
        EntityKind::SiacoinTransfer
        | EntityKind::SiafundTransfer
        | EntityKind::StorageProof
        | EntityKind::AllowancePost
        | EntityKind::CollateralPost => {
            resolve_transaction(db, &classification.master_hash, &mut record).await?;
        }
        // Block reward entries carry no distinct master hash; the raw
        // identifier is the transaction key.
        EntityKind::BlockReward => resolve_transaction(db, identifier, &mut record).await?,
        EntityKind::HostAnnouncement => {
            resolve_host_announcement(db, &classification.master_hash, &mut record).await?;
        }
        EntityKind::Contract => {
            resolve_contract(db, &classification.master_hash, &mut record).await?;
        }
        EntityKind::Revision => {
            resolve_revision(db, &classification.master_hash, &mut record).await?;
        }
        EntityKind::ContractResolution => {
            resolve_resolution(db, &classification.master_hash, &mut record).await?;
        }
        // The classification row alone is the whole record.
        EntityKind::Unknown => {}
    }

    Ok(record)
}

/// Address: net balances plus the newest 100 movements and the height the
/// address was first seen at.
async fn resolve_address(
    db: &ExplorerDb,
    address: &str,
    record: &mut CompositeRecord,
) -> Result<(), ApiError> {
    let mut entries = db.address_changes(address).await?;

    let total_tx_count = entries.len();
    let (balance_sc, balance_sf) =
        ledger::net_changes(entries.iter().map(|e| (e.sc_change, e.sf_change)));

    entries.sort_by(|a, b| b.height.cmp(&a.height));
    let first_seen = entries.last().map_or(0, |e| e.height);
    entries.truncate(ledger::PAGE_SIZE);

    record.push(&AddressSummary {
        balance_sc,
        balance_sf,
        total_tx_count,
        first_seen,
        last100_transactions: entries,
    });

    Ok(())
}

/// Block: metadata by height, then the transactions it contains.
async fn resolve_block(
    db: &ExplorerDb,
    master_hash: &str,
    record: &mut CompositeRecord,
) -> Result<(), ApiError> {
    // The master hash of a block is its height as text.
    let Ok(height) = master_hash.parse::<i64>() else {
        tracing::warn!(
            target: "navigator::resolve",
            master_hash,
            "block classification with non-numeric height"
        );
        record.push_empty();
        record.push(&Transactions::<crate::model::BlockTx> {
            transactions: Vec::new(),
        });
        return Ok(());
    };

    match db.block_info(height).await? {
        Some(meta) => record.push(&meta),
        None => record.push_empty(),
    }

    let transactions = db.block_transactions(height).await?;
    record.push(&Transactions { transactions });

    Ok(())
}

/// Transaction kinds: metadata by transaction hash, then the balance
/// deltas of every address it touched.
async fn resolve_transaction(
    db: &ExplorerDb,
    tx_hash: &str,
    record: &mut CompositeRecord,
) -> Result<(), ApiError> {
    match db.tx_info(tx_hash).await? {
        Some(meta) => record.push(&meta),
        None => record.push_empty(),
    }

    let transactions = db.tx_deltas(tx_hash).await?;
    record.push(&Transactions { transactions });

    Ok(())
}

/// Host announcement: announcement metadata (with the announced IP), then
/// the balance deltas of the announcement transaction.
async fn resolve_host_announcement(
    db: &ExplorerDb,
    master_hash: &str,
    record: &mut CompositeRecord,
) -> Result<(), ApiError> {
    match db.host_announcement(master_hash).await? {
        Some(meta) => record.push(&meta),
        None => record.push_empty(),
    }

    let transactions = db.plain_deltas(master_hash).await?;
    record.push(&Transactions { transactions });

    Ok(())
}

/// Contract: metadata → revision → resolution → storage proof. The last
/// two sections exist even when no resolution was ever posted.
async fn resolve_contract(
    db: &ExplorerDb,
    master_hash: &str,
    record: &mut CompositeRecord,
) -> Result<(), ApiError> {
    let Some(contract) = db.contract_by_master(master_hash).await? else {
        // Without a contract row there is no ContractId to chain on;
        // emit placeholders for all four dependent sections.
        for _ in 0..4 {
            record.push_empty();
        }
        return Ok(());
    };

    let contract_id = contract.contract_id.clone();
    record.push(&contract);

    match db.revision_by_contract(&contract_id).await? {
        Some(revision) => record.push(&revision),
        None => record.push_empty(),
    }

    match db.resolution_by_contract(&contract_id).await? {
        Some(resolution) => {
            let proof_hash = resolution.proof_posting_hash.clone();
            record.push(&resolution);

            match proof_hash.as_deref() {
                Some(hash) if !hash.is_empty() => match db.tx_info(hash).await? {
                    Some(proof) => record.push(&proof),
                    None => record.push_empty(),
                },
                _ => record.push_empty(),
            }
        }
        None => {
            // No resolution: placeholder for it and for the storage proof.
            record.push_empty();
            record.push_empty();
        }
    }

    Ok(())
}

/// Revision: revision metadata, then the balance deltas of the revision
/// transaction.
async fn resolve_revision(
    db: &ExplorerDb,
    master_hash: &str,
    record: &mut CompositeRecord,
) -> Result<(), ApiError> {
    match db.revision_by_master(master_hash).await? {
        Some(meta) => record.push(&meta),
        None => record.push_empty(),
    }

    let transactions = db.plain_deltas(master_hash).await?;
    record.push(&Transactions { transactions });

    Ok(())
}

/// Contract resolution: resolution metadata, then the balance deltas of
/// the resolving transaction.
async fn resolve_resolution(
    db: &ExplorerDb,
    master_hash: &str,
    record: &mut CompositeRecord,
) -> Result<(), ApiError> {
    match db.resolution_by_master(master_hash).await? {
        Some(meta) => record.push(&meta),
        None => record.push_empty(),
    }

    let transactions = db.plain_deltas(master_hash).await?;
    record.push(&Transactions { transactions });

    Ok(())
}
