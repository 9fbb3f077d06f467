//! Balance netting and transaction merging.
//!
//! Pure routines shared by the single-address cascade and the batch
//! aggregator. Sums of signed ledger movements can come out negative for
//! some addresses (an accounting artifact of how the ingester splits
//! internal transfers); reported balances clamp to zero.

use std::collections::HashMap;

use crate::model::BatchTx;

/// Transactions returned per history page.
pub const PAGE_SIZE: usize = 100;

/// Clamps a net balance to zero. Negative sums are internal artifacts,
/// never a true holding.
pub fn clamp_balance(sum: i64) -> i64 {
    sum.max(0)
}

/// Sums `(ScChange, SfChange)` pairs and clamps each total.
pub fn net_changes<I>(changes: I) -> (i64, i64)
where
    I: IntoIterator<Item = (i64, i64)>,
{
    let (mut sc, mut sf) = (0i64, 0i64);
    for (d_sc, d_sf) in changes {
        sc += d_sc;
        sf += d_sf;
    }
    (clamp_balance(sc), clamp_balance(sf))
}

/// Merges ledger entries sharing a `MasterHash` into one logical
/// transaction by summing their changes. An internal transfer between two
/// queried addresses touches the same underlying transaction twice and
/// must not be listed or counted twice.
///
/// First occurrence wins the non-summed fields; input order is preserved.
pub fn merge_by_master(entries: Vec<BatchTx>) -> Vec<BatchTx> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(entries.len());
    let mut merged: Vec<BatchTx> = Vec::with_capacity(entries.len());

    for entry in entries {
        match index.get(&entry.master_hash) {
            Some(&slot) => {
                merged[slot].sc_change += entry.sc_change;
                merged[slot].sf_change += entry.sf_change;
            }
            None => {
                index.insert(entry.master_hash.clone(), merged.len());
                merged.push(entry);
            }
        }
    }

    merged
}

/// Normalizes a caller-supplied page number: anything non-positive or
/// missing means page 1.
pub fn normalize_page(page: Option<i64>) -> usize {
    match page {
        Some(p) if p > 0 => p as usize,
        _ => 1,
    }
}

/// Returns the slice for 1-indexed `page`, clipped to the available count.
/// A page past the end is empty, not an error.
pub fn page_slice<T>(items: &[T], page: usize) -> &[T] {
    let start = page
        .saturating_sub(1)
        .saturating_mul(PAGE_SIZE)
        .min(items.len());
    let end = start.saturating_add(PAGE_SIZE).min(items.len());
    &items[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(address: &str, master: &str, sc: i64, sf: i64, height: i64) -> BatchTx {
        BatchTx {
            address: address.into(),
            master_hash: master.into(),
            sc_change: sc,
            sf_change: sf,
            height,
            timestamp: height * 600,
            tx_type: "ScTx".into(),
        }
    }

    #[test]
    fn negative_sums_clamp_to_zero() {
        let (sc, sf) = net_changes([(5, 2), (-10, -1)]);
        assert_eq!(sc, 0);
        assert_eq!(sf, 1);
    }

    #[test]
    fn positive_sums_pass_through() {
        let (sc, sf) = net_changes([(5, 0), (7, 3)]);
        assert_eq!(sc, 12);
        assert_eq!(sf, 3);
    }

    #[test]
    fn empty_changes_net_to_zero() {
        let (sc, sf) = net_changes(Vec::<(i64, i64)>::new());
        assert_eq!(sc, 0);
        assert_eq!(sf, 0);
    }

    #[test]
    fn merge_sums_entries_sharing_a_master_hash() {
        let merged = merge_by_master(vec![
            tx("a1", "m1", 5, 0, 10),
            tx("a2", "m1", -2, 1, 10),
            tx("a1", "m2", 7, 0, 11),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].master_hash, "m1");
        assert_eq!(merged[0].sc_change, 3);
        assert_eq!(merged[0].sf_change, 1);
        assert_eq!(merged[1].sc_change, 7);
    }

    #[test]
    fn merge_keeps_distinct_masters_apart() {
        let merged = merge_by_master(vec![tx("a", "m1", 1, 0, 1), tx("a", "m2", 2, 0, 2)]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn page_defaults_to_one() {
        assert_eq!(normalize_page(None), 1);
        assert_eq!(normalize_page(Some(0)), 1);
        assert_eq!(normalize_page(Some(-3)), 1);
        assert_eq!(normalize_page(Some(4)), 4);
    }

    #[test]
    fn page_slice_returns_requested_window() {
        let items: Vec<i64> = (0..250).collect();
        assert_eq!(page_slice(&items, 1), &items[0..100]);
        assert_eq!(page_slice(&items, 2), &items[100..200]);
        assert_eq!(page_slice(&items, 3), &items[200..250]);
    }

    #[test]
    fn out_of_range_page_is_empty() {
        let items: Vec<i64> = (0..50).collect();
        assert!(page_slice(&items, 2).is_empty());
        assert!(page_slice(&items, usize::MAX).is_empty());
    }
}
