//! memory.rs
//!
//! In-memory series backing the source capabilities. They double as the raw
//! data that adapters wrap.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use super::{AnalogSource, DataSource, EntityId, EventSource, IntervalSource, LineSource};
use crate::time::{convert_index, TimeFrame, TimeFrameIndex, TimeFrameInterval};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeriesError {
    #[error("Series '{name}': expected {expected} entries, got {actual}")]
    LengthMismatch { name: String, expected: usize, actual: usize },
    #[error("Series '{name}': sample indices must be strictly increasing")]
    UnsortedIndices { name: String },
}

fn check_len(name: &str, expected: usize, actual: usize) -> Result<(), SeriesError> {
    if expected != actual {
        return Err(SeriesError::LengthMismatch { name: name.to_string(), expected, actual });
    }
    Ok(())
}

fn sequential_ids(n: usize) -> Vec<EntityId> {
    (0..n as u64).map(EntityId).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self { Self { x, y } }
}

// --- Analog ---

#[derive(Debug, Clone)]
pub struct AnalogSeries {
    name: String,
    time_frame: Arc<TimeFrame>,
    indices: Vec<TimeFrameIndex>,
    values: Vec<f64>,
}

impl AnalogSeries {
    pub fn new(
        name: impl Into<String>,
        time_frame: Arc<TimeFrame>,
        indices: Vec<TimeFrameIndex>,
        values: Vec<f64>,
    ) -> Result<Self, SeriesError> {
        let name = name.into();
        check_len(&name, indices.len(), values.len())?;
        if indices.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SeriesError::UnsortedIndices { name });
        }
        Ok(Self { name, time_frame, indices, values })
    }

    /// One sample per index of the frame, starting at index 0.
    pub fn dense(name: impl Into<String>, time_frame: Arc<TimeFrame>, values: Vec<f64>) -> Self {
        let indices = (0..values.len() as i64).map(TimeFrameIndex).collect();
        Self { name: name.into(), time_frame, indices, values }
    }
}

impl DataSource for AnalogSeries {
    fn name(&self) -> &str { &self.name }
    fn time_frame(&self) -> &Arc<TimeFrame> { &self.time_frame }
    fn len(&self) -> usize { self.values.len() }
}

impl AnalogSource for AnalogSeries {
    fn indices(&self) -> &[TimeFrameIndex] { &self.indices }
    fn values(&self) -> &[f64] { &self.values }
}

// --- Events ---

#[derive(Debug, Clone)]
pub struct EventSeries {
    name: String,
    time_frame: Arc<TimeFrame>,
    events: Vec<TimeFrameIndex>,
    entity_ids: Vec<EntityId>,
}

impl EventSeries {
    pub fn new(name: impl Into<String>, time_frame: Arc<TimeFrame>, mut events: Vec<TimeFrameIndex>) -> Self {
        events.sort_unstable();
        let entity_ids = sequential_ids(events.len());
        Self { name: name.into(), time_frame, events, entity_ids }
    }

    /// Events with explicit provenance ids. Sorting keeps each id with its event.
    pub fn with_entity_ids(
        name: impl Into<String>,
        time_frame: Arc<TimeFrame>,
        events: Vec<TimeFrameIndex>,
        entity_ids: Vec<EntityId>,
    ) -> Result<Self, SeriesError> {
        let name = name.into();
        check_len(&name, events.len(), entity_ids.len())?;
        let mut pairs: Vec<_> = events.into_iter().zip(entity_ids).collect();
        pairs.sort_by_key(|(event, _)| *event);
        let (events, entity_ids) = pairs.into_iter().unzip();
        Ok(Self { name, time_frame, events, entity_ids })
    }
}

impl DataSource for EventSeries {
    fn name(&self) -> &str { &self.name }
    fn time_frame(&self) -> &Arc<TimeFrame> { &self.time_frame }
    fn len(&self) -> usize { self.events.len() }
}

impl EventSource for EventSeries {
    fn events(&self) -> &[TimeFrameIndex] { &self.events }
    fn entity_ids(&self) -> &[EntityId] { &self.entity_ids }
}

// --- Intervals ---

#[derive(Debug, Clone)]
pub struct IntervalSeries {
    name: String,
    time_frame: Arc<TimeFrame>,
    intervals: Vec<TimeFrameInterval>,
    entity_ids: Vec<EntityId>,
}

impl IntervalSeries {
    pub fn new(name: impl Into<String>, time_frame: Arc<TimeFrame>, mut intervals: Vec<TimeFrameInterval>) -> Self {
        intervals.sort_by_key(|iv| (iv.start, iv.end));
        let entity_ids = sequential_ids(intervals.len());
        Self { name: name.into(), time_frame, intervals, entity_ids }
    }

    pub fn with_entity_ids(
        name: impl Into<String>,
        time_frame: Arc<TimeFrame>,
        intervals: Vec<TimeFrameInterval>,
        entity_ids: Vec<EntityId>,
    ) -> Result<Self, SeriesError> {
        let name = name.into();
        check_len(&name, intervals.len(), entity_ids.len())?;
        let mut pairs: Vec<_> = intervals.into_iter().zip(entity_ids).collect();
        pairs.sort_by_key(|(iv, _)| (iv.start, iv.end));
        let (intervals, entity_ids) = pairs.into_iter().unzip();
        Ok(Self { name, time_frame, intervals, entity_ids })
    }
}

impl DataSource for IntervalSeries {
    fn name(&self) -> &str { &self.name }
    fn time_frame(&self) -> &Arc<TimeFrame> { &self.time_frame }
    fn len(&self) -> usize { self.intervals.len() }
}

impl IntervalSource for IntervalSeries {
    fn intervals(&self) -> &[TimeFrameInterval] { &self.intervals }
    fn entity_ids(&self) -> &[EntityId] { &self.entity_ids }
}

// --- Lines ---

/// One polyline together with its provenance id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineEntity {
    pub id: EntityId,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone)]
pub struct LineSeries {
    name: String,
    time_frame: Arc<TimeFrame>,
    lines: BTreeMap<TimeFrameIndex, Vec<LineEntity>>,
    next_id: u64,
}

impl LineSeries {
    pub fn new(name: impl Into<String>, time_frame: Arc<TimeFrame>) -> Self {
        Self { name: name.into(), time_frame, lines: BTreeMap::new(), next_id: 0 }
    }

    /// Appends a line at `index` and returns the id it was given.
    pub fn add_line(&mut self, index: TimeFrameIndex, points: Vec<Point>) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.lines.entry(index).or_default().push(LineEntity { id, points });
        id
    }

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self { name: name.into(), ..self.clone() }
    }

    /// Indices that hold at least one line, ascending.
    pub fn populated_indices(&self) -> impl Iterator<Item = TimeFrameIndex> + '_ {
        self.lines.iter().filter(|(_, v)| !v.is_empty()).map(|(k, _)| *k)
    }
}

impl DataSource for LineSeries {
    fn name(&self) -> &str { &self.name }
    fn time_frame(&self) -> &Arc<TimeFrame> { &self.time_frame }
    fn len(&self) -> usize { self.lines.values().map(Vec::len).sum() }
}

impl LineSource for LineSeries {
    fn entities_at(&self, index: TimeFrameIndex, frame: &TimeFrame) -> &[LineEntity] {
        let own = convert_index(index, frame, &self.time_frame);
        self.lines.get(&own).map(Vec::as_slice).unwrap_or(&[])
    }
}

// --- Points (raw only) ---

/// One point per populated index. Exposed to tables through the point adapters.
#[derive(Debug, Clone)]
pub struct PointSeries {
    name: String,
    time_frame: Arc<TimeFrame>,
    indices: Vec<TimeFrameIndex>,
    points: Vec<Point>,
}

impl PointSeries {
    pub fn new(
        name: impl Into<String>,
        time_frame: Arc<TimeFrame>,
        indices: Vec<TimeFrameIndex>,
        points: Vec<Point>,
    ) -> Result<Self, SeriesError> {
        let name = name.into();
        check_len(&name, indices.len(), points.len())?;
        if indices.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SeriesError::UnsortedIndices { name });
        }
        Ok(Self { name, time_frame, indices, points })
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn time_frame(&self) -> &Arc<TimeFrame> { &self.time_frame }
    pub fn indices(&self) -> &[TimeFrameIndex] { &self.indices }
    pub fn points(&self) -> &[Point] { &self.points }

    /// Projects one coordinate into an analog series sharing this frame.
    pub fn component(&self, name: impl Into<String>, pick: impl Fn(&Point) -> f32) -> AnalogSeries {
        AnalogSeries {
            name: name.into(),
            time_frame: self.time_frame.clone(),
            indices: self.indices.clone(),
            values: self.points.iter().map(|p| pick(p) as f64).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Arc<TimeFrame> { Arc::new(TimeFrame::from_range(0, 10, 1).unwrap()) }

    #[test]
    fn test_analog_rejects_mismatched_lengths_and_unsorted_indices() {
        let err = AnalogSeries::new("a", frame(), vec![TimeFrameIndex(0)], vec![]).unwrap_err();
        assert_eq!(err, SeriesError::LengthMismatch { name: "a".into(), expected: 1, actual: 0 });

        let err = AnalogSeries::new("a", frame(), vec![TimeFrameIndex(2), TimeFrameIndex(1)], vec![0.0, 1.0]);
        assert!(matches!(err, Err(SeriesError::UnsortedIndices { .. })));
    }

    #[test]
    fn test_event_ids_follow_their_events_when_sorted() {
        let events = EventSeries::with_entity_ids(
            "e",
            frame(),
            vec![TimeFrameIndex(5), TimeFrameIndex(1)],
            vec![EntityId(50), EntityId(10)],
        )
        .unwrap();
        assert_eq!(events.events(), &[TimeFrameIndex(1), TimeFrameIndex(5)]);
        assert_eq!(events.entity_ids(), &[EntityId(10), EntityId(50)]);
    }

    #[test]
    fn test_line_series_groups_entities_per_index() {
        let f = frame();
        let mut lines = LineSeries::new("whiskers", f.clone());
        lines.add_line(TimeFrameIndex(2), vec![Point::new(0.0, 0.0)]);
        let second = lines.add_line(TimeFrameIndex(2), vec![Point::new(1.0, 1.0)]);
        assert_eq!(second, EntityId(1));
        assert_eq!(lines.entity_count_at(TimeFrameIndex(2), &f), 2);
        assert_eq!(lines.entity_count_at(TimeFrameIndex(3), &f), 0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.populated_indices().collect::<Vec<_>>(), vec![TimeFrameIndex(2)]);
    }

    #[test]
    fn test_point_component_projection() {
        let points = PointSeries::new(
            "nose",
            frame(),
            vec![TimeFrameIndex(0), TimeFrameIndex(3)],
            vec![Point::new(1.5, -2.0), Point::new(4.0, 8.0)],
        )
        .unwrap();
        let y = points.component("nose_Y", |p| p.y);
        assert_eq!(y.name(), "nose_Y");
        assert_eq!(y.values(), &[-2.0, 8.0]);
        assert_eq!(y.indices(), points.indices());
    }
}
