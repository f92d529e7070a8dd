//! catalog.rs
//!
//! Named lookup of time frames, sources and raw data. The pipeline resolves
//! every `data_source` and `timeframe` key through a `DataCatalog`.
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::memory::{LineSeries, PointSeries};
use super::{AnalogSource, DataSourceVariant, EventSource, IntervalSource, LineSource};
use crate::time::TimeFrame;

/// Key of the frame used when a configuration names none.
pub const DEFAULT_TIME_FRAME: &str = "time";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RawDataType {
    Points,
    Lines,
}

impl fmt::Display for RawDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawDataType::Points => f.write_str("points"),
            RawDataType::Lines => f.write_str("lines"),
        }
    }
}

/// Data that is not yet a source; adapters turn it into one.
#[derive(Debug, Clone)]
pub enum RawData {
    Points(Arc<PointSeries>),
    Lines(Arc<LineSeries>),
}

impl RawData {
    pub fn data_type(&self) -> RawDataType {
        match self {
            RawData::Points(_) => RawDataType::Points,
            RawData::Lines(_) => RawDataType::Lines,
        }
    }
}

#[derive(Debug, Default)]
pub struct DataCatalog {
    time_frames: BTreeMap<String, Arc<TimeFrame>>,
    analog: BTreeMap<String, Arc<dyn AnalogSource>>,
    events: BTreeMap<String, Arc<dyn EventSource>>,
    intervals: BTreeMap<String, Arc<dyn IntervalSource>>,
    lines: BTreeMap<String, Arc<dyn LineSource>>,
    raw: BTreeMap<String, RawData>,
}

impl DataCatalog {
    pub fn new() -> Self { Self::default() }

    pub fn add_time_frame(&mut self, key: impl Into<String>, frame: Arc<TimeFrame>) -> &mut Self {
        self.time_frames.insert(key.into(), frame);
        self
    }
    pub fn add_analog(&mut self, key: impl Into<String>, source: Arc<dyn AnalogSource>) -> &mut Self {
        self.analog.insert(key.into(), source);
        self
    }
    pub fn add_events(&mut self, key: impl Into<String>, source: Arc<dyn EventSource>) -> &mut Self {
        self.events.insert(key.into(), source);
        self
    }
    pub fn add_intervals(&mut self, key: impl Into<String>, source: Arc<dyn IntervalSource>) -> &mut Self {
        self.intervals.insert(key.into(), source);
        self
    }
    pub fn add_lines(&mut self, key: impl Into<String>, source: Arc<dyn LineSource>) -> &mut Self {
        self.lines.insert(key.into(), source);
        self
    }
    pub fn add_raw(&mut self, key: impl Into<String>, data: RawData) -> &mut Self {
        self.raw.insert(key.into(), data);
        self
    }

    pub fn time_frame(&self, key: &str) -> Option<&Arc<TimeFrame>> { self.time_frames.get(key) }
    pub fn default_time_frame(&self) -> Option<&Arc<TimeFrame>> { self.time_frames.get(DEFAULT_TIME_FRAME) }
    pub fn time_frame_keys(&self) -> impl Iterator<Item = &str> { self.time_frames.keys().map(String::as_str) }

    pub fn analog(&self, key: &str) -> Option<&Arc<dyn AnalogSource>> { self.analog.get(key) }
    pub fn events(&self, key: &str) -> Option<&Arc<dyn EventSource>> { self.events.get(key) }
    pub fn intervals(&self, key: &str) -> Option<&Arc<dyn IntervalSource>> { self.intervals.get(key) }
    pub fn lines(&self, key: &str) -> Option<&Arc<dyn LineSource>> { self.lines.get(key) }
    pub fn raw(&self, key: &str) -> Option<&RawData> { self.raw.get(key) }

    /// Looks `key` up as analog, event, interval and line, in that order.
    /// The first capability that knows the key wins.
    pub fn resolve(&self, key: &str) -> Option<DataSourceVariant> {
        if let Some(s) = self.analog.get(key) {
            return Some(DataSourceVariant::Analog(s.clone()));
        }
        if let Some(s) = self.events.get(key) {
            return Some(DataSourceVariant::Event(s.clone()));
        }
        if let Some(s) = self.intervals.get(key) {
            return Some(DataSourceVariant::Interval(s.clone()));
        }
        self.lines.get(key).map(|s| DataSourceVariant::Line(s.clone()))
    }
}
