//! interval_reduction.rs
//!
//! Reduces the analog samples inside each row interval to one value.
//!
//! An interval that holds no samples reduces to NaN for Mean, Max, Min and
//! StdDev, and to 0 for Sum and Count.
use std::sync::Arc;
use wide::f64x4;

use super::{ColumnComputer, ComputedColumn};
use crate::error::ComputeError;
use crate::plan::{ExecutionPlan, RowSelectorKind};
use crate::sources::AnalogSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionType {
    Mean,
    Max,
    Min,
    StdDev,
    Sum,
    Count,
}

/// Lane-parallel sum. The tail that does not fill a lane is added serially.
#[inline]
pub fn simd_sum(values: &[f64]) -> f64 {
    let mut chunks = values.chunks_exact(4);
    let mut acc = f64x4::from([0.0; 4]);
    for c in &mut chunks {
        acc = acc + f64x4::from([c[0], c[1], c[2], c[3]]);
    }
    acc.to_array().iter().sum::<f64>() + chunks.remainder().iter().sum::<f64>()
}

impl ReductionType {
    pub fn reduce(&self, values: &[f64]) -> f64 {
        let n = values.len();
        match self {
            ReductionType::Count => n as f64,
            ReductionType::Sum => simd_sum(values),
            _ if n == 0 => f64::NAN,
            ReductionType::Mean => simd_sum(values) / n as f64,
            ReductionType::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            ReductionType::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            ReductionType::StdDev => {
                // Population formula: a single sample has zero spread.
                let mean = simd_sum(values) / n as f64;
                let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
                var.sqrt()
            }
        }
    }
}

#[derive(Debug)]
pub struct IntervalReductionComputer {
    source: Arc<dyn AnalogSource>,
    reduction: ReductionType,
    source_name: String,
}

impl IntervalReductionComputer {
    pub fn new(source: Arc<dyn AnalogSource>, reduction: ReductionType, source_name: impl Into<String>) -> Self {
        Self { source, reduction, source_name: source_name.into() }
    }
}

impl ColumnComputer<f64> for IntervalReductionComputer {
    fn compute(&self, plan: &ExecutionPlan) -> Result<ComputedColumn<f64>, ComputeError> {
        let intervals = plan.require_intervals(&self.source_name)?;
        let dest = plan.time_frame();
        let values = intervals
            .iter()
            .map(|iv| self.reduction.reduce(self.source.data_in_range(iv.start, iv.end, dest)))
            .collect();
        Ok(ComputedColumn::untracked(values))
    }

    fn required_row_kind(&self) -> RowSelectorKind { RowSelectorKind::Interval }
    fn source_dependency(&self) -> &str { &self.source_name }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::AnalogSeries;
    use crate::time::{TimeFrame, TimeFrameIndex, TimeFrameInterval};
    use rstest::rstest;

    fn frame() -> Arc<TimeFrame> { Arc::new(TimeFrame::from_range(0, 20, 1).unwrap()) }

    #[rstest]
    #[case(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 21.0)]
    #[case(&[1.5, 2.5], 4.0)]
    #[case(&[], 0.0)]
    fn test_simd_sum_matches_serial(#[case] values: &[f64], #[case] expected: f64) {
        assert_eq!(simd_sum(values), expected);
    }

    #[rstest]
    #[case(ReductionType::Mean, 2.5)]
    #[case(ReductionType::Max, 4.0)]
    #[case(ReductionType::Min, 1.0)]
    #[case(ReductionType::Sum, 10.0)]
    #[case(ReductionType::Count, 4.0)]
    fn test_reductions(#[case] reduction: ReductionType, #[case] expected: f64) {
        assert_eq!(reduction.reduce(&[1.0, 2.0, 3.0, 4.0]), expected);
    }

    #[test]
    fn test_population_std_dev() {
        let sd = ReductionType::StdDev.reduce(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((sd - 2.0).abs() < 1e-12);
        assert_eq!(ReductionType::StdDev.reduce(&[3.0]), 0.0);
    }

    #[test]
    fn test_empty_interval_policy() {
        assert!(ReductionType::Mean.reduce(&[]).is_nan());
        assert!(ReductionType::Max.reduce(&[]).is_nan());
        assert!(ReductionType::Min.reduce(&[]).is_nan());
        assert!(ReductionType::StdDev.reduce(&[]).is_nan());
        assert_eq!(ReductionType::Sum.reduce(&[]), 0.0);
        assert_eq!(ReductionType::Count.reduce(&[]), 0.0);
    }

    #[test]
    fn test_mean_over_row_intervals() {
        let f = frame();
        let source = Arc::new(AnalogSeries::dense("lfp", f.clone(), (0..20).map(|v| v as f64).collect()));
        let computer = IntervalReductionComputer::new(source, ReductionType::Mean, "lfp");
        let plan = ExecutionPlan::from_intervals(
            vec![TimeFrameInterval::new(1, 3).unwrap(), TimeFrameInterval::new(10, 10).unwrap()],
            f.clone(),
        );
        assert_eq!(computer.compute(&plan).unwrap().values, vec![2.0, 10.0]);

        let points = ExecutionPlan::from_indices(vec![TimeFrameIndex(1)], f);
        assert!(matches!(computer.compute(&points), Err(ComputeError::RowKindMismatch { .. })));
    }

    #[test]
    fn test_interval_without_samples_is_nan() {
        let f = frame();
        let source = Arc::new(
            AnalogSeries::new("sparse", f.clone(), vec![TimeFrameIndex(0), TimeFrameIndex(19)], vec![1.0, 2.0]).unwrap(),
        );
        let computer = IntervalReductionComputer::new(source, ReductionType::Mean, "sparse");
        let plan = ExecutionPlan::from_intervals(vec![TimeFrameInterval::new(5, 8).unwrap()], f);
        assert!(computer.compute(&plan).unwrap().values[0].is_nan());
    }
}
