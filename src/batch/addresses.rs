//! Batch address aggregation.
//!
//! One IN-list query over the ledger, then three folds: a clamped total
//! balance, a clamped per-address balance for every requested address
//! (zero-match addresses included), and a merged, height-ordered,
//! paginated transaction history.

use std::collections::HashMap;

use navigator_common::is_safe_identifier;

use crate::batch::MAX_BATCH;
use crate::error::ApiError;
use crate::ledger;
use crate::model::{
    AddressBalance, AddressBalances, BatchSummary, CompositeRecord, TransactionPage,
};
use crate::store::ExplorerDb;

/// Splits the newline-delimited address list, caps it at [`MAX_BATCH`]
/// lines, and keeps only addresses that pass validation.
pub fn parse_address_list(query: &str) -> Vec<String> {
    query
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_BATCH)
        .filter(|line| is_safe_identifier(line))
        .map(str::to_string)
        .collect()
}

/// Aggregates balances and merged transaction history for a batch of
/// addresses. `page` is 1-indexed; non-positive or missing means page 1.
pub async fn aggregate_addresses(
    db: &ExplorerDb,
    query: &str,
    page: Option<i64>,
) -> Result<CompositeRecord, ApiError> {
    let addresses = parse_address_list(query);
    if addresses.is_empty() {
        return Err(ApiError::MalformedBatchInput("no valid addresses"));
    }

    let page = ledger::normalize_page(page);

    tracing::debug!(
        target: "navigator::batch",
        count = addresses.len(),
        page,
        "address batch queried"
    );

    let entries = db.batch_address_changes(&addresses).await?;

    // Total balance across the whole batch.
    let (balance_sc, balance_sf) =
        ledger::net_changes(entries.iter().map(|e| (e.sc_change, e.sf_change)));

    // Net balance per requested address. Addresses the ledger has never
    // seen still get a zero entry.
    let mut sums: HashMap<&str, (i64, i64)> = HashMap::with_capacity(addresses.len());
    for entry in &entries {
        let slot = sums.entry(entry.address.as_str()).or_insert((0, 0));
        slot.0 += entry.sc_change;
        slot.1 += entry.sf_change;
    }
    let per_address: Vec<AddressBalance> = addresses
        .iter()
        .map(|address| {
            let (sc, sf) = sums.get(address.as_str()).copied().unwrap_or((0, 0));
            AddressBalance {
                address: address.clone(),
                sc: ledger::clamp_balance(sc),
                sf: ledger::clamp_balance(sf),
            }
        })
        .collect();

    // Merge internal transfers that touch the same transaction, newest
    // height first, then slice out the requested page.
    let mut merged = ledger::merge_by_master(entries);
    let total_tx_count = merged.len();
    merged.sort_by(|a, b| b.height.cmp(&a.height));
    let page_txs = ledger::page_slice(&merged, page).to_vec();

    let mut record = CompositeRecord::new();
    record.push(&BatchSummary {
        balance_sc,
        balance_sf,
        total_tx_count,
        page,
    });
    record.push(&AddressBalances {
        addresses: per_address,
    });
    record.push(&TransactionPage {
        last100_transactions: page_txs,
    });

    Ok(record)
}
