//! Host contract reconciliation.
//!
//! Decodes the fixed-width contract export a host operator uploads, looks
//! up the stored outcome of every contract in one query, and folds the
//! matches into status counts and a three-way revenue tally. Contracts
//! the chain never saw are reported separately, never silently dropped.

use std::collections::HashMap;
use std::ops::Range;

use navigator_common::{fixed_field, is_safe_identifier};

use crate::batch::MAX_BATCH;
use crate::error::ApiError;
use crate::model::{
    CompositeRecord, ContractEntry, ContractMeta, ContractsNotFound, ReconcileSummary,
    ReconciledContract, ReconciledContracts,
};
use crate::store::ExplorerDb;

// Column offsets of the fixed-width export. These are a compatibility
// contract with the external producer and must match it exactly.
const CONTRACT_ID_SPAN: Range<usize> = 0..64;
const STATUS_SPAN: Range<usize> = 68..78;
const LOCKED_SPAN: Range<usize> = 106..114;
const RISKED_SPAN: Range<usize> = 127..135;
const REVENUE_SPAN: Range<usize> = 148..156;

/// Decodes the contract file into structured entries. The header row is
/// skipped; a line whose contract id fails validation contributes
/// nothing.
pub fn parse_contract_file(text: &str) -> Vec<ContractEntry> {
    text.lines()
        .skip(1)
        .filter_map(|line| {
            let contract_id = fixed_field(line, CONTRACT_ID_SPAN);
            if !is_safe_identifier(contract_id) {
                return None;
            }
            Some(ContractEntry {
                contract_id: contract_id.to_string(),
                status: fixed_field(line, STATUS_SPAN).to_string(),
                locked: fixed_field(line, LOCKED_SPAN).to_string(),
                risked: fixed_field(line, RISKED_SPAN).to_string(),
                revenue: fixed_field(line, REVENUE_SPAN).to_string(),
            })
        })
        .collect()
}

/// Reconciles parsed contract entries against stored contract outcomes.
pub async fn reconcile_contracts(
    db: &ExplorerDb,
    mut entries: Vec<ContractEntry>,
) -> Result<CompositeRecord, ApiError> {
    entries.truncate(MAX_BATCH);
    if entries.is_empty() {
        return Err(ApiError::MalformedBatchInput("no valid contract entries"));
    }

    tracing::debug!(
        target: "navigator::batch",
        count = entries.len(),
        "contract batch queried"
    );

    let ids: Vec<&str> = entries.iter().map(|e| e.contract_id.as_str()).collect();
    let rows = db.contracts_by_ids(&ids).await?;

    // Rows arrive ascending by height; for a duplicated id the last
    // insertion wins, i.e. the highest row.
    let by_id: HashMap<&str, &ContractMeta> =
        rows.iter().map(|row| (row.contract_id.as_str(), row)).collect();

    let mut summary = ReconcileSummary::default();
    let mut contracts = Vec::with_capacity(entries.len());
    let mut not_found = Vec::new();

    for entry in entries {
        let Some(row) = by_id.get(entry.contract_id.as_str()) else {
            not_found.push(entry.contract_id);
            continue;
        };

        // A complete-fail that carries no missed-proof penalty was never
        // used by the renter; the failure is not attributable to the host.
        let final_status =
            if row.status == "complete-fail" && row.missed_proof_3_value == 0.0 {
                "unused".to_string()
            } else {
                row.status.clone()
            };

        match final_status.as_str() {
            "complete-fail" => {
                summary.countfail += 1;
                summary.revenuelost += row.missed_proof_2_value;
                summary.revenuenet -= row.missed_proof_2_value;
            }
            "complete-succ" => {
                // The collateral the host posted comes back out of the
                // valid-proof payout.
                let gain = row.valid_proof_2_value - row.host_value;
                summary.countsuccess += 1;
                summary.revenuegain += gain;
                summary.revenuenet += gain;
            }
            "unused" => {
                let gain = row.valid_proof_2_value - row.host_value;
                summary.countunused += 1;
                summary.revenuegain += gain;
                summary.revenuenet += gain;
            }
            "ongoing" => {
                summary.countongoing += 1;
            }
            _ => {}
        }

        contracts.push(ReconciledContract {
            contract_id: entry.contract_id,
            status: entry.status,
            locked: entry.locked,
            risked: entry.risked,
            revenue: entry.revenue,
            duration: row.window_end - row.height,
            timestamp: row.timestamp,
            filesize: row.current_file_size,
            statusnavigator: final_status,
        });
    }

    let mut record = CompositeRecord::new();
    record.push(&summary);
    record.push(&ReconciledContracts { contracts });
    record.push(&ContractsNotFound {
        contracts_not_found: not_found,
    });

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::memory_db;

    /// Builds one fixed-width line with fields at the production offsets.
    fn file_line(contract_id: &str, status: &str, locked: &str, risked: &str, revenue: &str) -> String {
        let mut line = vec![b' '; 160];
        let mut put = |span: Range<usize>, value: &str| {
            let bytes = value.as_bytes();
            line[span.start..span.start + bytes.len()].copy_from_slice(bytes);
        };
        put(CONTRACT_ID_SPAN, contract_id);
        put(STATUS_SPAN, status);
        put(LOCKED_SPAN, locked);
        put(RISKED_SPAN, risked);
        put(REVENUE_SPAN, revenue);
        String::from_utf8(line).unwrap()
    }

    fn cid(n: u8) -> String {
        format!("{:02x}", n).repeat(32)
    }

    async fn seed_contract(
        db: &crate::store::ExplorerDb,
        contract_id: &str,
        height: i64,
        status: &str,
        missed3: f64,
    ) {
        db.execute_raw(&format!(
            "INSERT INTO ContractInfo VALUES \
             ('master-{contract_id}', '{contract_id}', {height}, {}, {height}, {}, \
              '{status}', 4096, 10.0, 2.0, 5.0, 3.0, {missed3})",
            height * 600,
            height + 100,
        ))
        .await
        .unwrap();
    }

    #[test]
    fn parser_reads_fields_at_fixed_offsets() {
        let id = cid(0xab);
        let text = format!(
            "header line\n{}",
            file_line(&id, "ongoing", "12.5", "3.25", "0.75")
        );

        let entries = parse_contract_file(&text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].contract_id, id);
        assert_eq!(entries[0].status.trim(), "ongoing");
        assert_eq!(entries[0].locked.trim(), "12.5");
        assert_eq!(entries[0].risked.trim(), "3.25");
        assert_eq!(entries[0].revenue.trim(), "0.75");
    }

    #[test]
    fn parser_skips_the_header_and_invalid_ids() {
        let good = file_line(&cid(1), "ongoing", "1", "1", "1");
        let bad = file_line("zz!!", "ongoing", "1", "1", "1");
        let text = format!("header\n{bad}\n{good}\n");

        let entries = parse_contract_file(&text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].contract_id, cid(1));
    }

    #[test]
    fn parser_tolerates_short_lines() {
        let text = format!("header\n{}\n", cid(2));
        let entries = parse_contract_file(&text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, "");
        assert_eq!(entries[0].revenue, "");
    }

    fn entry(contract_id: &str) -> ContractEntry {
        ContractEntry {
            contract_id: contract_id.to_string(),
            status: "ongoing".into(),
            locked: String::new(),
            risked: String::new(),
            revenue: String::new(),
        }
    }

    #[tokio::test]
    async fn empty_batch_is_malformed() {
        let db = memory_db().await;
        let err = reconcile_contracts(&db, Vec::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::MalformedBatchInput(_)));
    }

    #[tokio::test]
    async fn unmatched_contracts_land_in_not_found_only() {
        let db = memory_db().await;
        seed_contract(&db, &cid(1), 10, "ongoing", 1.0).await;

        let record = reconcile_contracts(&db, vec![entry(&cid(1)), entry(&cid(9))])
            .await
            .unwrap();
        let sections = record.sections();

        assert_eq!(sections[0]["countongoing"], 1);
        assert_eq!(sections[1]["contracts"].as_array().unwrap().len(), 1);
        let not_found = sections[2]["contractsNotFound"].as_array().unwrap();
        assert_eq!(not_found.len(), 1);
        assert_eq!(not_found[0], cid(9));
        // No revenue effect from the unmatched contract.
        assert_eq!(sections[0]["revenuenet"], 0.0);
    }

    #[tokio::test]
    async fn penalty_free_failure_reclassifies_as_unused() {
        let db = memory_db().await;
        seed_contract(&db, &cid(1), 10, "complete-fail", 0.0).await;

        let record = reconcile_contracts(&db, vec![entry(&cid(1))]).await.unwrap();
        let sections = record.sections();

        assert_eq!(sections[0]["countunused"], 1);
        assert_eq!(sections[0]["countfail"], 0);
        assert_eq!(
            sections[1]["contracts"][0]["statusnavigator"],
            "unused"
        );
        // Unused contracts still earn the fee margin: 5.0 - 2.0.
        assert_eq!(sections[0]["revenuegain"], 3.0);
        assert_eq!(sections[0]["revenuenet"], 3.0);
    }

    #[tokio::test]
    async fn failed_contracts_lose_the_missed_proof_value() {
        let db = memory_db().await;
        seed_contract(&db, &cid(1), 10, "complete-fail", 1.0).await;

        let record = reconcile_contracts(&db, vec![entry(&cid(1))]).await.unwrap();
        let sections = record.sections();

        assert_eq!(sections[0]["countfail"], 1);
        assert_eq!(sections[0]["revenuelost"], 3.0);
        assert_eq!(sections[0]["revenuenet"], -3.0);
        assert_eq!(sections[0]["revenuegain"], 0.0);
    }

    #[tokio::test]
    async fn successful_contracts_earn_payout_minus_collateral() {
        let db = memory_db().await;
        seed_contract(&db, &cid(1), 10, "complete-succ", 1.0).await;
        seed_contract(&db, &cid(2), 20, "ongoing", 1.0).await;

        let record = reconcile_contracts(&db, vec![entry(&cid(1)), entry(&cid(2))])
            .await
            .unwrap();
        let sections = record.sections();

        assert_eq!(sections[0]["countsuccess"], 1);
        assert_eq!(sections[0]["countongoing"], 1);
        assert_eq!(sections[0]["revenuegain"], 3.0);
        assert_eq!(sections[0]["revenuenet"], 3.0);

        let contracts = sections[1]["contracts"].as_array().unwrap();
        assert_eq!(contracts[0]["duration"], 100);
        assert_eq!(contracts[0]["filesize"], 4096);
    }
}
