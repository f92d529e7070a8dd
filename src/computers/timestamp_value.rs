//! timestamp_value.rs
use std::sync::Arc;

use super::{ColumnComputer, ComputedColumn};
use crate::error::ComputeError;
use crate::plan::{ExecutionPlan, RowSelectorKind};
use crate::sources::AnalogSource;

/// Direct lookup of the analog value at each row. Rows where the source holds
/// no sample yield NaN.
#[derive(Debug)]
pub struct TimestampValueComputer {
    source: Arc<dyn AnalogSource>,
    source_name: String,
    row_kind: RowSelectorKind,
}

impl TimestampValueComputer {
    pub fn new(source: Arc<dyn AnalogSource>, source_name: impl Into<String>) -> Self {
        Self { source, source_name: source_name.into(), row_kind: RowSelectorKind::Timestamp }
    }

    /// The same lookup, registered for index-selected tables.
    pub fn for_indices(source: Arc<dyn AnalogSource>, source_name: impl Into<String>) -> Self {
        Self { row_kind: RowSelectorKind::Index, ..Self::new(source, source_name) }
    }
}

impl ColumnComputer<f64> for TimestampValueComputer {
    fn compute(&self, plan: &ExecutionPlan) -> Result<ComputedColumn<f64>, ComputeError> {
        let rows = plan.require_points(&self.source_name, self.row_kind)?;
        let dest = plan.time_frame();
        let values = rows
            .iter()
            .map(|row| self.source.value_at(row.time_index, dest).unwrap_or(f64::NAN))
            .collect();
        Ok(ComputedColumn::untracked(values))
    }

    fn required_row_kind(&self) -> RowSelectorKind { self.row_kind }
    fn source_dependency(&self) -> &str { &self.source_name }
}
