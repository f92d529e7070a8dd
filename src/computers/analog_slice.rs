//! analog_slice.rs
use std::marker::PhantomData;
use std::sync::Arc;

use super::{ColumnComputer, ColumnElement, ComputedColumn};
use crate::error::ComputeError;
use crate::plan::{ExecutionPlan, RowSelectorKind};
use crate::sources::AnalogSource;

pub trait SliceOutput: ColumnElement {
    fn from_samples(samples: &[f64]) -> Self;
}

impl SliceOutput for Vec<f64> {
    fn from_samples(samples: &[f64]) -> Self { samples.to_vec() }
}

impl SliceOutput for Vec<f32> {
    fn from_samples(samples: &[f64]) -> Self { samples.iter().map(|&v| v as f32).collect() }
}

/// Gathers the raw analog samples inside each row interval.
#[derive(Debug)]
pub struct AnalogSliceGathererComputer<T> {
    source: Arc<dyn AnalogSource>,
    source_name: String,
    _output: PhantomData<fn() -> T>,
}

impl<T: SliceOutput> AnalogSliceGathererComputer<T> {
    pub fn new(source: Arc<dyn AnalogSource>, source_name: impl Into<String>) -> Self {
        Self { source, source_name: source_name.into(), _output: PhantomData }
    }
}

impl<T: SliceOutput> ColumnComputer<T> for AnalogSliceGathererComputer<T> {
    fn compute(&self, plan: &ExecutionPlan) -> Result<ComputedColumn<T>, ComputeError> {
        let intervals = plan.require_intervals(&self.source_name)?;
        let dest = plan.time_frame();
        let values = intervals
            .iter()
            .map(|iv| T::from_samples(self.source.data_in_range(iv.start, iv.end, dest)))
            .collect();
        Ok(ComputedColumn::untracked(values))
    }

    fn required_row_kind(&self) -> RowSelectorKind { RowSelectorKind::Interval }
    fn source_dependency(&self) -> &str { &self.source_name }
}
