//! Segment planning.

use crate::models::{ResolvedItem, Segment};

/// Length given to the last resolvable track, in seconds.
pub const DEFAULT_TAIL_SECONDS: u64 = 600;

/// Plan segments with the default tail length.
pub fn plan_segments(items: &[ResolvedItem]) -> Vec<Segment> {
    plan_segments_with_tail(items, DEFAULT_TAIL_SECONDS)
}

/// Derive `[start, end)` segments from resolved items.
///
/// Unresolved items are skipped. Order is kept as given (never re-sorted), so
/// each segment ends where the next resolved item starts; out-of-order or
/// repeated timestamps produce degenerate segments for the extractor to
/// reject. The last segment runs for `tail_seconds`.
pub fn plan_segments_with_tail(items: &[ResolvedItem], tail_seconds: u64) -> Vec<Segment> {
    let resolved: Vec<(&ResolvedItem, u64)> = items
        .iter()
        .filter_map(|item| item.resolved_seconds.map(|s| (item, s)))
        .collect();

    resolved
        .iter()
        .enumerate()
        .map(|(i, (item, start))| {
            let end = match resolved.get(i + 1) {
                Some((_, next_start)) => *next_start,
                None => start.saturating_add(tail_seconds),
            };
            Segment {
                item: (*item).clone(),
                start_seconds: *start,
                end_seconds: end,
            }
        })
        .collect()
}
