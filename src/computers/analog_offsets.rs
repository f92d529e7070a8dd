//! analog_offsets.rs
//!
//! Samples an analog source at fixed integer offsets (in source-frame samples)
//! around every row timestamp, one output column per offset.
use std::sync::Arc;

use super::{ComputedColumn, MultiColumnComputer};
use crate::error::ComputeError;
use crate::plan::{ExecutionPlan, RowSelectorKind};
use crate::sources::AnalogSource;
use crate::time::convert_index;

/// Parses a comma separated offset list such as `"-2,-1,0,1"`. Unparsable
/// entries count as 0; an empty list means `[0]`.
pub fn parse_offsets(raw: Option<&str>) -> Vec<i64> {
    let offsets: Vec<i64> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.parse().unwrap_or(0))
        .collect();
    if offsets.is_empty() { vec![0] } else { offsets }
}

pub fn offset_suffixes(offsets: &[i64]) -> Vec<String> {
    offsets
        .iter()
        .map(|&o| if o >= 0 { format!("t+{}", o) } else { format!("t{}", o) })
        .collect()
}

#[derive(Debug)]
pub struct AnalogTimestampOffsetsComputer {
    source: Arc<dyn AnalogSource>,
    source_name: String,
    offsets: Vec<i64>,
}

impl AnalogTimestampOffsetsComputer {
    pub fn new(source: Arc<dyn AnalogSource>, source_name: impl Into<String>, offsets: Vec<i64>) -> Self {
        Self { source, source_name: source_name.into(), offsets }
    }
}

impl MultiColumnComputer<f64> for AnalogTimestampOffsetsComputer {
    fn output_suffixes(&self) -> Vec<String> { offset_suffixes(&self.offsets) }

    fn compute_batch(&self, plan: &ExecutionPlan) -> Result<Vec<ComputedColumn<f64>>, ComputeError> {
        let rows = plan.require_points(&self.source_name, RowSelectorKind::Timestamp)?;
        let dest = plan.time_frame();
        let own = self.source.time_frame();

        let mut columns = vec![Vec::with_capacity(rows.len()); self.offsets.len()];
        for row in rows.iter() {
            let base = convert_index(row.time_index, dest, own);
            for (column, &offset) in columns.iter_mut().zip(&self.offsets) {
                column.push(self.source.sample_at(base + offset).unwrap_or(f64::NAN));
            }
        }
        Ok(columns.into_iter().map(ComputedColumn::untracked).collect())
    }

    fn required_row_kind(&self) -> RowSelectorKind { RowSelectorKind::Timestamp }
    fn source_dependency(&self) -> &str { &self.source_name }
}
