//! timestamp_in_interval.rs
use std::sync::Arc;

use super::{ColumnComputer, ComputedColumn};
use crate::error::ComputeError;
use crate::plan::{ExecutionPlan, RowSelectorKind};
use crate::sources::IntervalSource;
use crate::time::{convert_interval, TimeFrameInterval};

/// True for each row timestamp that lies inside any source interval, both
/// ends inclusive.
#[derive(Debug)]
pub struct TimestampInIntervalComputer {
    source: Arc<dyn IntervalSource>,
    source_name: String,
}

impl TimestampInIntervalComputer {
    pub fn new(source: Arc<dyn IntervalSource>, source_name: impl Into<String>) -> Self {
        Self { source, source_name: source_name.into() }
    }
}

impl ColumnComputer<bool> for TimestampInIntervalComputer {
    fn compute(&self, plan: &ExecutionPlan) -> Result<ComputedColumn<bool>, ComputeError> {
        let rows = plan.require_points(&self.source_name, RowSelectorKind::Timestamp)?;
        let dest = plan.time_frame();
        let own = self.source.time_frame();
        // Sorted by start, and conversion keeps that order.
        let converted: Vec<TimeFrameInterval> =
            self.source.intervals().iter().map(|iv| convert_interval(iv, own, dest)).collect();

        let values = rows
            .iter()
            .map(|row| {
                let candidates = converted.partition_point(|iv| iv.start <= row.time_index);
                converted[..candidates].iter().any(|iv| iv.end >= row.time_index)
            })
            .collect();
        Ok(ComputedColumn::untracked(values))
    }

    fn required_row_kind(&self) -> RowSelectorKind { RowSelectorKind::Timestamp }
    fn source_dependency(&self) -> &str { &self.source_name }
}
