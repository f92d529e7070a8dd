//! line_sampling.rs
//!
//! Samples x/y along each polyline at equally spaced fractions of its arc
//! length. A timestamp may hold several lines, so this computer drives entity
//! expansion: each (timestamp, line) pair can become its own row.
use std::sync::Arc;

use super::{ComputedColumn, EntityIds, MultiColumnComputer};
use crate::error::ComputeError;
use crate::plan::{ExecutionPlan, PlanRows, RowSelectorKind};
use crate::sources::{LineSource, Point};

pub const DEFAULT_SEGMENTS: usize = 2;
pub const MAX_SEGMENTS: usize = 1000;

/// `segments + 1` fractions from 0.0 to 1.0.
pub fn sample_fractions(segments: usize) -> Vec<f64> {
    let segments = segments.max(1);
    (0..=segments).map(|i| i as f64 / segments as f64).collect()
}

/// `x@0.000, y@0.000, x@0.500, ...` for each sample fraction.
pub fn line_suffixes(segments: usize) -> Vec<String> {
    sample_fractions(segments)
        .iter()
        .flat_map(|f| [format!("x@{:.3}", f), format!("y@{:.3}", f)])
        .collect()
}

/// Point at `fraction` of the polyline's arc length. Degenerate lines collapse
/// to their first point; an empty line yields the origin.
pub fn sample_line(points: &[Point], fraction: f64) -> (f64, f64) {
    let Some(first) = points.first() else { return (0.0, 0.0) };
    let mut cumulative = Vec::with_capacity(points.len());
    cumulative.push(0.0f64);
    for w in points.windows(2) {
        let (dx, dy) = ((w[1].x - w[0].x) as f64, (w[1].y - w[0].y) as f64);
        let prev = cumulative[cumulative.len() - 1];
        cumulative.push(prev + dx.hypot(dy));
    }
    let total = cumulative[cumulative.len() - 1];
    if total <= 0.0 {
        return (first.x as f64, first.y as f64);
    }

    let target = fraction.clamp(0.0, 1.0) * total;
    let seg = cumulative.partition_point(|&c| c < target);
    if seg == 0 {
        return (first.x as f64, first.y as f64);
    }
    let (a, b) = (points[seg - 1], points[seg]);
    let seg_len = cumulative[seg] - cumulative[seg - 1];
    let t = if seg_len > 0.0 { (target - cumulative[seg - 1]) / seg_len } else { 0.0 };
    (
        a.x as f64 + t * (b.x - a.x) as f64,
        a.y as f64 + t * (b.y - a.y) as f64,
    )
}

#[derive(Debug)]
pub struct LineSamplingComputer {
    source: Arc<dyn LineSource>,
    source_name: String,
    segments: usize,
}

impl LineSamplingComputer {
    pub fn new(source: Arc<dyn LineSource>, source_name: impl Into<String>, segments: usize) -> Self {
        Self { source, source_name: source_name.into(), segments: segments.max(1) }
    }
}

impl MultiColumnComputer<f64> for LineSamplingComputer {
    fn output_suffixes(&self) -> Vec<String> { line_suffixes(self.segments) }

    fn compute_batch(&self, plan: &ExecutionPlan) -> Result<Vec<ComputedColumn<f64>>, ComputeError> {
        let rows = plan.require_points(&self.source_name, RowSelectorKind::Timestamp)?;
        let dest = plan.time_frame();
        let fractions = sample_fractions(self.segments);

        let mut columns = vec![Vec::with_capacity(rows.len()); fractions.len() * 2];
        let mut entity_ids: Vec<EntityIds> = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            // Unexpanded rows read the first line at their timestamp.
            let entity = self.source.entities_at(row.time_index, dest).get(row.entity.unwrap_or(0));
            for (k, &fraction) in fractions.iter().enumerate() {
                // Missing entities are zero-filled.
                let (x, y) = entity.map_or((0.0, 0.0), |e| sample_line(&e.points, fraction));
                columns[2 * k].push(x);
                columns[2 * k + 1].push(y);
            }
            entity_ids.push(entity.map(|e| e.id).into_iter().collect());
        }

        Ok(columns
            .into_iter()
            .map(|values| ComputedColumn::tracked(values, entity_ids.clone()))
            .collect())
    }

    fn entity_counts(&self, plan: &ExecutionPlan) -> Option<Vec<usize>> {
        let PlanRows::Indices(timestamps) = plan.rows() else { return None };
        let dest = plan.time_frame();
        Some(timestamps.iter().map(|&t| self.source.entity_count_at(t, dest)).collect())
    }

    fn required_row_kind(&self) -> RowSelectorKind { RowSelectorKind::Timestamp }
    fn source_dependency(&self) -> &str { &self.source_name }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::RowId;
    use crate::sources::{EntityId, LineSeries};
    use crate::time::{TimeFrame, TimeFrameIndex};
    use rstest::rstest;

    fn p(x: f32, y: f32) -> Point { Point::new(x, y) }

    #[test]
    fn test_suffixes() {
        assert_eq!(line_suffixes(2), vec!["x@0.000", "y@0.000", "x@0.500", "y@0.500", "x@1.000", "y@1.000"]);
        assert_eq!(line_suffixes(0).len(), 4); // Clamped to one segment
    }

    #[rstest]
    #[case(0.0, (0.0, 0.0))]
    #[case(0.5, (10.0, 0.0))]
    #[case(0.75, (10.0, 5.0))]
    #[case(1.0, (10.0, 10.0))]
    fn test_arc_length_interpolation(#[case] fraction: f64, #[case] expected: (f64, f64)) {
        let line = [p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0)];
        assert_eq!(sample_line(&line, fraction), expected);
    }

    #[test]
    fn test_degenerate_lines() {
        assert_eq!(sample_line(&[], 0.5), (0.0, 0.0));
        assert_eq!(sample_line(&[p(3.0, 4.0), p(3.0, 4.0)], 0.5), (3.0, 4.0));
    }

    fn fixture() -> (Arc<TimeFrame>, Arc<LineSeries>) {
        let frame = Arc::new(TimeFrame::from_range(0, 3, 1).unwrap());
        let mut lines = LineSeries::new("whiskers", frame.clone());
        lines.add_line(TimeFrameIndex(1), vec![p(0.0, 0.0), p(10.0, 0.0)]);
        lines.add_line(TimeFrameIndex(2), vec![p(0.0, 0.0), p(0.0, 4.0)]);
        lines.add_line(TimeFrameIndex(2), vec![p(2.0, 2.0), p(4.0, 2.0)]);
        (frame, Arc::new(lines))
    }

    #[test]
    fn test_entity_counts_per_timestamp() {
        let (frame, lines) = fixture();
        let computer = LineSamplingComputer::new(lines, "whiskers", 1);
        let plan = ExecutionPlan::from_indices(vec![TimeFrameIndex(0), TimeFrameIndex(1), TimeFrameIndex(2)], frame);
        assert_eq!(computer.entity_counts(&plan), Some(vec![0, 1, 2]));
    }

    #[test]
    fn test_expanded_rows_sample_their_entity_and_zero_fill() {
        let (frame, lines) = fixture();
        let computer = LineSamplingComputer::new(lines, "whiskers", 1);
        let rows = vec![
            RowId { time_index: TimeFrameIndex(0), entity: None },
            RowId { time_index: TimeFrameIndex(1), entity: Some(0) },
            RowId { time_index: TimeFrameIndex(2), entity: Some(1) },
        ];
        let columns = computer.compute_batch(&ExecutionPlan::from_rows(rows, frame)).unwrap();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[2].values, vec![0.0, 10.0, 4.0]); // x@1.000
        assert_eq!(columns[3].values, vec![0.0, 0.0, 2.0]); // y@1.000
        let ids = columns[0].entity_ids.as_ref().unwrap();
        assert!(ids[0].is_empty());
        assert_eq!(ids[2].as_slice(), &[EntityId(2)]);
    }
}
