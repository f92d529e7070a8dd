//! interval_property.rs
//!
//! Start, end and duration of each row interval, in destination-frame index
//! units.
use std::marker::PhantomData;
use std::sync::Arc;

use super::{ColumnComputer, ColumnElement, ComputedColumn};
use crate::error::ComputeError;
use crate::plan::{ExecutionPlan, RowSelectorKind};
use crate::sources::IntervalSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalProperty {
    Start,
    End,
    Duration,
}

/// Numeric outputs an index offset can be cast into.
pub trait NumericOutput: ColumnElement + Copy {
    fn from_index(v: i64) -> Self;
}

impl NumericOutput for f64 { fn from_index(v: i64) -> Self { v as f64 } }
impl NumericOutput for f32 { fn from_index(v: i64) -> Self { v as f32 } }
impl NumericOutput for i64 { fn from_index(v: i64) -> Self { v } }
impl NumericOutput for i32 { fn from_index(v: i64) -> Self { v as i32 } }

#[derive(Debug)]
pub struct IntervalPropertyComputer<T> {
    // Held for dependency tracking; the values come from the rows themselves.
    _source: Arc<dyn IntervalSource>,
    property: IntervalProperty,
    source_name: String,
    _output: PhantomData<fn() -> T>,
}

impl<T: NumericOutput> IntervalPropertyComputer<T> {
    pub fn new(source: Arc<dyn IntervalSource>, property: IntervalProperty, source_name: impl Into<String>) -> Self {
        Self { _source: source, property, source_name: source_name.into(), _output: PhantomData }
    }
}

impl<T: NumericOutput> ColumnComputer<T> for IntervalPropertyComputer<T> {
    fn compute(&self, plan: &ExecutionPlan) -> Result<ComputedColumn<T>, ComputeError> {
        let intervals = plan.require_intervals(&self.source_name)?;
        let values = intervals
            .iter()
            .map(|iv| match self.property {
                IntervalProperty::Start => T::from_index(iv.start.value()),
                IntervalProperty::End => T::from_index(iv.end.value()),
                IntervalProperty::Duration => T::from_index(iv.duration()),
            })
            .collect();
        Ok(ComputedColumn::untracked(values))
    }

    fn required_row_kind(&self) -> RowSelectorKind { RowSelectorKind::Interval }
    fn source_dependency(&self) -> &str { &self.source_name }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::IntervalSeries;
    use crate::time::{TimeFrame, TimeFrameIndex, TimeFrameInterval};
    use rstest::rstest;

    fn setup() -> (Arc<TimeFrame>, Arc<dyn IntervalSource>) {
        let frame = Arc::new(TimeFrame::from_range(0, 201, 1).unwrap());
        let source = Arc::new(IntervalSeries::new("behavior", frame.clone(), vec![TimeFrameInterval::new(10, 15).unwrap()]));
        (frame, source)
    }

    #[rstest]
    #[case(IntervalProperty::Start, vec![10.0, 70.0])]
    #[case(IntervalProperty::End, vec![15.0, 120.0])]
    #[case(IntervalProperty::Duration, vec![5.0, 50.0])]
    fn test_properties_as_double(#[case] property: IntervalProperty, #[case] expected: Vec<f64>) {
        let (frame, source) = setup();
        let plan = ExecutionPlan::from_intervals(
            vec![TimeFrameInterval::new(10, 15).unwrap(), TimeFrameInterval::new(70, 120).unwrap()],
            frame,
        );
        let computer = IntervalPropertyComputer::<f64>::new(source, property, "behavior");
        assert_eq!(computer.compute(&plan).unwrap().values, expected);
    }

    #[test]
    fn test_duration_as_int64_and_row_kind_check() {
        let (frame, source) = setup();
        let computer = IntervalPropertyComputer::<i64>::new(source, IntervalProperty::Duration, "behavior");
        let plan = ExecutionPlan::from_intervals(vec![TimeFrameInterval::new(70, 120).unwrap()], frame.clone());
        assert_eq!(computer.compute(&plan).unwrap().values, vec![50]);

        let points = ExecutionPlan::from_indices(vec![TimeFrameIndex(0)], frame);
        assert!(computer.compute(&points).is_err());
    }
}
