//! interval_overlap.rs
//!
//! Relates each row interval to the intervals of a column source. Column
//! intervals are converted into the destination frame before comparison.
use std::sync::Arc;

use super::{ColumnComputer, ComputedColumn, EntityIds};
use crate::error::ComputeError;
use crate::plan::{ExecutionPlan, RowSelectorKind};
use crate::sources::IntervalSource;
use crate::time::{convert_interval, TimeFrameInterval};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapOperation {
    /// Position of the last column interval that fully contains the row, or -1.
    AssignId,
    /// Number of column intervals overlapping the row (closed on both ends).
    CountOverlaps,
    /// Start of the assigned interval in the destination frame, or -1.
    AssignStart,
    /// End of the assigned interval in the destination frame, or -1.
    AssignEnd,
}

#[derive(Debug)]
pub struct IntervalOverlapComputer {
    source: Arc<dyn IntervalSource>,
    operation: OverlapOperation,
    source_name: String,
}

impl IntervalOverlapComputer {
    pub fn new(source: Arc<dyn IntervalSource>, operation: OverlapOperation, source_name: impl Into<String>) -> Self {
        Self { source, operation, source_name: source_name.into() }
    }
}

impl ColumnComputer<i64> for IntervalOverlapComputer {
    fn compute(&self, plan: &ExecutionPlan) -> Result<ComputedColumn<i64>, ComputeError> {
        let rows = plan.require_intervals(&self.source_name)?;
        let dest = plan.time_frame();
        let own = self.source.time_frame();
        let ids = self.source.entity_ids();
        let columns: Vec<TimeFrameInterval> =
            self.source.intervals().iter().map(|iv| convert_interval(iv, own, dest)).collect();

        let mut values = Vec::with_capacity(rows.len());
        let mut entity_ids: Vec<EntityIds> = Vec::with_capacity(rows.len());
        for row in rows {
            match self.operation {
                OverlapOperation::CountOverlaps => {
                    let hits: EntityIds = columns
                        .iter()
                        .zip(ids)
                        .filter(|(col, _)| col.overlaps(row))
                        .map(|(_, id)| *id)
                        .collect();
                    values.push(hits.len() as i64);
                    entity_ids.push(hits);
                }
                op => {
                    // Later matches overwrite earlier ones.
                    let assigned = columns.iter().rposition(|col| col.contains_interval(row));
                    let value = match (assigned, op) {
                        (None, _) => -1,
                        (Some(pos), OverlapOperation::AssignStart) => columns[pos].start.value(),
                        (Some(pos), OverlapOperation::AssignEnd) => columns[pos].end.value(),
                        (Some(pos), _) => pos as i64,
                    };
                    values.push(value);
                    entity_ids.push(assigned.map(|pos| ids[pos]).into_iter().collect());
                }
            }
        }
        Ok(ComputedColumn::tracked(values, entity_ids))
    }

    fn required_row_kind(&self) -> RowSelectorKind { RowSelectorKind::Interval }
    fn source_dependency(&self) -> &str { &self.source_name }
}
