//! The four source capabilities that raw data is adapted to.
//!
//! Every range query takes indices expressed in the *caller's* frame. The
//! source converts them through absolute time into its own frame before it
//! looks anything up, which is what lets one table mix sampling rates.
pub mod catalog;
pub mod memory;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::time::{convert_index, TimeFrame, TimeFrameIndex, TimeFrameInterval};

pub use catalog::{DataCatalog, RawData, RawDataType, DEFAULT_TIME_FRAME};
pub use memory::{AnalogSeries, EventSeries, IntervalSeries, LineEntity, LineSeries, Point, PointSeries};

/// Opaque provenance id of one raw record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceKind {
    Analog,
    Event,
    Interval,
    Line,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::Analog => "analog",
            SourceKind::Event => "event",
            SourceKind::Interval => "interval",
            SourceKind::Line => "line",
        };
        f.write_str(s)
    }
}

pub trait DataSource: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
    fn time_frame(&self) -> &Arc<TimeFrame>;
    /// Number of stored records.
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Borrowed view of analog samples, parallel arrays in source-frame indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalogSlice<'a> {
    pub indices: &'a [TimeFrameIndex],
    pub values: &'a [f64],
}

pub trait AnalogSource: DataSource {
    fn indices(&self) -> &[TimeFrameIndex];
    fn values(&self) -> &[f64];

    /// Value stored at an index of the source's own frame, if any.
    fn sample_at(&self, source_index: TimeFrameIndex) -> Option<f64> {
        let indices = self.indices();
        indices.binary_search(&source_index).ok().map(|pos| self.values()[pos])
    }

    /// Value at a caller-frame index. `None` when the source holds no sample there.
    fn value_at(&self, index: TimeFrameIndex, frame: &TimeFrame) -> Option<f64> {
        self.sample_at(convert_index(index, frame, self.time_frame()))
    }

    /// All samples inside the caller-frame range `[start, end]`.
    fn samples_in_range(&self, start: TimeFrameIndex, end: TimeFrameIndex, frame: &TimeFrame) -> AnalogSlice<'_> {
        let own = self.time_frame();
        let range = sorted_range(self.indices(), convert_index(start, frame, own), convert_index(end, frame, own));
        AnalogSlice { indices: &self.indices()[range.clone()], values: &self.values()[range] }
    }

    fn data_in_range(&self, start: TimeFrameIndex, end: TimeFrameIndex, frame: &TimeFrame) -> &[f64] {
        self.samples_in_range(start, end, frame).values
    }
}

pub trait EventSource: DataSource {
    /// Event positions in the source frame, sorted ascending.
    fn events(&self) -> &[TimeFrameIndex];
    fn entity_ids(&self) -> &[EntityId];

    /// Positions (into `events()`) of the events inside the caller-frame range.
    fn events_in_range(&self, start: TimeFrameIndex, end: TimeFrameIndex, frame: &TimeFrame) -> Range<usize> {
        let own = self.time_frame();
        sorted_range(self.events(), convert_index(start, frame, own), convert_index(end, frame, own))
    }
}

pub trait IntervalSource: DataSource {
    /// Intervals in the source frame, sorted by start.
    fn intervals(&self) -> &[TimeFrameInterval];
    fn entity_ids(&self) -> &[EntityId];

    /// Positions of the intervals overlapping the caller-frame range.
    fn intervals_in_range(&self, start: TimeFrameIndex, end: TimeFrameIndex, frame: &TimeFrame) -> Vec<usize> {
        let own = self.time_frame();
        let query = TimeFrameInterval {
            start: convert_index(start, frame, own),
            end: convert_index(end, frame, own),
        };
        let candidates = self.intervals().partition_point(|iv| iv.start <= query.end);
        (0..candidates).filter(|&pos| self.intervals()[pos].overlaps(&query)).collect()
    }
}

pub trait LineSource: DataSource {
    /// The lines stored at a caller-frame index, in entity order.
    fn entities_at(&self, index: TimeFrameIndex, frame: &TimeFrame) -> &[LineEntity];

    fn entity_count_at(&self, index: TimeFrameIndex, frame: &TimeFrame) -> usize {
        self.entities_at(index, frame).len()
    }
}

/// Positions of the sorted `items` that fall inside `[lo, hi]`.
fn sorted_range(items: &[TimeFrameIndex], lo: TimeFrameIndex, hi: TimeFrameIndex) -> Range<usize> {
    let begin = items.partition_point(|&i| i < lo);
    let end = items.partition_point(|&i| i <= hi);
    begin..end.max(begin)
}

macro_rules! each_source {
    ($variant:expr, $s:ident => $body:expr) => {
        match $variant {
            DataSourceVariant::Analog($s) => $body,
            DataSourceVariant::Event($s) => $body,
            DataSourceVariant::Interval($s) => $body,
            DataSourceVariant::Line($s) => $body,
        }
    };
}

/// A source of any capability, shared by the registry and the computers it builds.
#[derive(Debug, Clone)]
pub enum DataSourceVariant {
    Analog(Arc<dyn AnalogSource>),
    Event(Arc<dyn EventSource>),
    Interval(Arc<dyn IntervalSource>),
    Line(Arc<dyn LineSource>),
}

impl DataSourceVariant {
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Analog(_) => SourceKind::Analog,
            Self::Event(_) => SourceKind::Event,
            Self::Interval(_) => SourceKind::Interval,
            Self::Line(_) => SourceKind::Line,
        }
    }

    pub fn name(&self) -> &str { each_source!(self, s => s.name()) }
    pub fn time_frame(&self) -> &Arc<TimeFrame> { each_source!(self, s => s.time_frame()) }
    pub fn len(&self) -> usize { each_source!(self, s => s.len()) }
    pub fn is_empty(&self) -> bool { each_source!(self, s => s.is_empty()) }

    pub fn as_analog(&self) -> Option<&Arc<dyn AnalogSource>> {
        if let Self::Analog(s) = self { Some(s) } else { None }
    }
    pub fn as_event(&self) -> Option<&Arc<dyn EventSource>> {
        if let Self::Event(s) = self { Some(s) } else { None }
    }
    pub fn as_interval(&self) -> Option<&Arc<dyn IntervalSource>> {
        if let Self::Interval(s) = self { Some(s) } else { None }
    }
    pub fn as_line(&self) -> Option<&Arc<dyn LineSource>> {
        if let Self::Line(s) = self { Some(s) } else { None }
    }
}
