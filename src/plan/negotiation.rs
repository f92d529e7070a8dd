//! negotiation.rs
//!
//! Whether a point row becomes several entity rows depends on every column
//! of the table at once, so the decision is made here, once, before any
//! column computes.
use super::{ExecutionPlan, PlanRows, RowId};

/// Per-row entity counts reported by the expanding column, plus whether a
/// sibling column needs every original row to survive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowExpansion {
    pub counts: Vec<usize>,
    pub keep_empty: bool,
}

/// Lowers `base` into the plan every column of the table will share.
///
/// A row with `n > 0` entities becomes `n` rows `(t, 0..n)`. A row with no
/// entities is dropped, unless `keep_empty` is set, in which case it stays as a
/// single `(t, None)` row that expanding columns fill with their neutral value.
pub fn negotiate_plan(base: ExecutionPlan, expansion: Option<RowExpansion>) -> ExecutionPlan {
    let Some(expansion) = expansion else { return base };
    let timestamps = match base.rows() {
        PlanRows::Indices(v) => v.clone(),
        // Interval rows and already-expanded rows are never re-expanded.
        PlanRows::Intervals(_) | PlanRows::Entities(_) => return base,
    };
    debug_assert_eq!(timestamps.len(), expansion.counts.len());

    let mut rows = Vec::with_capacity(expansion.counts.iter().sum::<usize>().max(timestamps.len()));
    for (i, &time_index) in timestamps.iter().enumerate() {
        match expansion.counts.get(i).copied().unwrap_or(0) {
            0 if expansion.keep_empty => rows.push(RowId { time_index, entity: None }),
            0 => {}
            n => rows.extend((0..n).map(|e| RowId { time_index, entity: Some(e) })),
        }
    }
    log::debug!("Row negotiation expanded {} timestamps into {} rows", timestamps.len(), rows.len());
    ExecutionPlan::from_rows(rows, base.time_frame().clone())
}
