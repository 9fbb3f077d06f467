//! Batch aggregation pipelines.
//!
//! Both pipelines accept an externally supplied list (addresses or
//! contract file lines), cap it at [`MAX_BATCH`] entries, run one IN-list
//! query, and fold the rows into an ordered-section response.

pub mod addresses;
pub mod contracts;

/// Entries accepted per batch request; anything beyond is silently
/// dropped, not rejected.
pub const MAX_BATCH: usize = 1000;
