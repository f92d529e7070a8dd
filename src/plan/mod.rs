//! Row descriptions. A `RowSelector` is what a configuration asks for; an
//! `ExecutionPlan` is the resolved, immutable row list a computer consumes.
pub mod negotiation;
pub mod selector;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::error::ComputeError;
use crate::time::{TimeFrame, TimeFrameIndex, TimeFrameInterval};

pub use negotiation::{negotiate_plan, RowExpansion};
pub use selector::RowSelector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RowSelectorKind {
    Index,
    Interval,
    Timestamp,
}

impl fmt::Display for RowSelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowSelectorKind::Index => f.write_str("index"),
            RowSelectorKind::Interval => f.write_str("interval"),
            RowSelectorKind::Timestamp => f.write_str("timestamp"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanRowKind {
    Indices,
    Intervals,
    Entities,
}

impl fmt::Display for PlanRowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanRowKind::Indices => f.write_str("index"),
            PlanRowKind::Intervals => f.write_str("interval"),
            PlanRowKind::Entities => f.write_str("entity"),
        }
    }
}

/// One point row: a time index and, after expansion, the entity ordinal at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId {
    pub time_index: TimeFrameIndex,
    pub entity: Option<usize>,
}

impl RowId {
    pub fn point(time_index: TimeFrameIndex) -> Self { Self { time_index, entity: None } }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanRows {
    Indices(Vec<TimeFrameIndex>),
    Intervals(Vec<TimeFrameInterval>),
    Entities(Vec<RowId>),
}

impl PlanRows {
    pub fn len(&self) -> usize {
        match self {
            PlanRows::Indices(v) => v.len(),
            PlanRows::Intervals(v) => v.len(),
            PlanRows::Entities(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn kind(&self) -> PlanRowKind {
        match self {
            PlanRows::Indices(_) => PlanRowKind::Indices,
            PlanRows::Intervals(_) => PlanRowKind::Intervals,
            PlanRows::Entities(_) => PlanRowKind::Entities,
        }
    }

    /// Keeps the rows at `positions`, in that order.
    pub fn select(&self, positions: &[usize]) -> PlanRows {
        match self {
            PlanRows::Indices(v) => PlanRows::Indices(positions.iter().map(|&i| v[i]).collect()),
            PlanRows::Intervals(v) => PlanRows::Intervals(positions.iter().map(|&i| v[i]).collect()),
            PlanRows::Entities(v) => PlanRows::Entities(positions.iter().map(|&i| v[i]).collect()),
        }
    }
}

/// Rows plus the destination frame every output is expressed against.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    rows: PlanRows,
    time_frame: Arc<TimeFrame>,
}

impl ExecutionPlan {
    pub fn new(rows: PlanRows, time_frame: Arc<TimeFrame>) -> Self {
        Self { rows, time_frame }
    }

    pub fn from_indices(indices: Vec<TimeFrameIndex>, time_frame: Arc<TimeFrame>) -> Self {
        Self::new(PlanRows::Indices(indices), time_frame)
    }

    pub fn from_intervals(intervals: Vec<TimeFrameInterval>, time_frame: Arc<TimeFrame>) -> Self {
        Self::new(PlanRows::Intervals(intervals), time_frame)
    }

    pub fn from_rows(rows: Vec<RowId>, time_frame: Arc<TimeFrame>) -> Self {
        Self::new(PlanRows::Entities(rows), time_frame)
    }

    pub fn rows(&self) -> &PlanRows { &self.rows }
    pub fn time_frame(&self) -> &Arc<TimeFrame> { &self.time_frame }
    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }
    pub fn row_kind(&self) -> PlanRowKind { self.rows.kind() }

    /// The interval rows, or a `RowKindMismatch` naming `computer`.
    pub fn require_intervals(&self, computer: &str) -> Result<&[TimeFrameInterval], ComputeError> {
        match &self.rows {
            PlanRows::Intervals(v) => Ok(v),
            other => Err(ComputeError::RowKindMismatch {
                computer: computer.to_string(),
                expected: RowSelectorKind::Interval,
                actual: other.kind(),
            }),
        }
    }

    /// The point rows (plain or entity-expanded), or a `RowKindMismatch`.
    pub fn require_points(&self, computer: &str, expected: RowSelectorKind) -> Result<Cow<'_, [RowId]>, ComputeError> {
        match &self.rows {
            PlanRows::Indices(v) => Ok(Cow::Owned(v.iter().copied().map(RowId::point).collect())),
            PlanRows::Entities(v) => Ok(Cow::Borrowed(v)),
            PlanRows::Intervals(_) => Err(ComputeError::RowKindMismatch {
                computer: computer.to_string(),
                expected,
                actual: PlanRowKind::Intervals,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Arc<TimeFrame> { Arc::new(TimeFrame::from_range(0, 10, 1).unwrap()) }

    #[test]
    fn test_interval_rows_reject_point_plan() {
        let plan = ExecutionPlan::from_indices(vec![TimeFrameIndex(1)], frame());
        let err = plan.require_intervals("Interval Mean").unwrap_err();
        assert_eq!(
            err,
            ComputeError::RowKindMismatch {
                computer: "Interval Mean".into(),
                expected: RowSelectorKind::Interval,
                actual: PlanRowKind::Indices,
            }
        );
    }

    #[test]
    fn test_point_rows_accept_indices_and_entities() {
        let plan = ExecutionPlan::from_indices(vec![TimeFrameIndex(4)], frame());
        let rows = plan.require_points("x", RowSelectorKind::Timestamp).unwrap();
        assert_eq!(rows.as_ref(), &[RowId::point(TimeFrameIndex(4))]);

        let expanded = vec![RowId { time_index: TimeFrameIndex(4), entity: Some(1) }];
        let plan = ExecutionPlan::from_rows(expanded.clone(), frame());
        assert!(matches!(plan.require_points("x", RowSelectorKind::Timestamp).unwrap(), Cow::Borrowed(_)));

        let plan = ExecutionPlan::from_intervals(vec![TimeFrameInterval::new(0, 1).unwrap()], frame());
        assert!(plan.require_points("x", RowSelectorKind::Timestamp).is_err());
    }

    #[test]
    fn test_select_rows_keeps_order() {
        let rows = PlanRows::Indices(vec![TimeFrameIndex(7), TimeFrameIndex(8), TimeFrameIndex(9)]);
        assert_eq!(rows.select(&[2, 0]), PlanRows::Indices(vec![TimeFrameIndex(9), TimeFrameIndex(7)]));
    }
}
