// src/process/merge.rs

use chrono::NaiveDate;
use tracing::debug;

use crate::record::{DailyRecord, DateKey, RecordSet};

/// Counts describing one merge, for the run summary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Existing records before the reference date, carried over.
    pub kept_past: usize,
    /// Existing records at/after the reference date, replaced by the new forecast.
    pub discarded_future: usize,
    /// Incoming records dated before the reference date.
    pub backfilled: usize,
    /// Incoming records whose date was already in the carried-over past.
    pub overridden_past: usize,
}

/// Merge a fresh forecast into the master record.
///
/// History before `reference` is kept as-is; everything the master holds at
/// or after `reference` is dropped in favour of `incoming`. Incoming days
/// before `reference` are accepted as backfill. Where both sides hold the
/// same day, the incoming record wins. The result is sorted with unique keys.
///
/// An empty `incoming` returns `existing` unchanged (normalized to sorted,
/// unique keys).
pub fn merge(existing: &RecordSet, incoming: &RecordSet, reference: NaiveDate) -> RecordSet {
    merge_with_stats(existing, incoming, reference).0
}

pub fn merge_with_stats(
    existing: &RecordSet,
    incoming: &RecordSet,
    reference: NaiveDate,
) -> (RecordSet, MergeStats) {
    let cutoff = DateKey::from(reference);
    let mut stats = MergeStats::default();

    if incoming.is_empty() {
        stats.kept_past = existing.len();
        return (existing.clone(), stats);
    }

    let (past, future): (Vec<&DailyRecord>, Vec<&DailyRecord>) =
        existing.iter().partition(|r| r.key() < cutoff);
    stats.kept_past = past.len();
    stats.discarded_future = future.len();

    for rec in incoming.iter().filter(|r| r.key() < cutoff) {
        stats.backfilled += 1;
        if existing.get(&rec.key()).is_some() {
            stats.overridden_past += 1;
        }
    }

    // past first, incoming last: last occurrence wins in `from_records`
    let combined: Vec<DailyRecord> = past
        .into_iter()
        .cloned()
        .chain(incoming.iter().cloned())
        .collect();
    let merged = RecordSet::from_records(combined);

    debug!(
        cutoff = %cutoff,
        kept_past = stats.kept_past,
        discarded_future = stats.discarded_future,
        backfilled = stats.backfilled,
        overridden_past = stats.overridden_past,
        merged = merged.len(),
        "merged forecast into master"
    );
    (merged, stats)
}
