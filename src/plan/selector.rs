//! selector.rs
//!
//! Configuration-time row descriptions, lowered into an `ExecutionPlan` when a
//! table is built.
use std::sync::Arc;

use super::{ExecutionPlan, RowSelectorKind};
use crate::error::ConfigError;
use crate::sources::{EventSource, IntervalSource};
use crate::time::{TimeFrame, TimeFrameIndex, TimeFrameInterval};

#[derive(Debug, Clone)]
pub enum RowSelector {
    Index { indices: Vec<TimeFrameIndex>, time_frame: Arc<TimeFrame> },
    Interval { intervals: Vec<TimeFrameInterval>, time_frame: Arc<TimeFrame> },
    Timestamp { timestamps: Vec<TimeFrameIndex>, time_frame: Arc<TimeFrame> },
}

impl RowSelector {
    /// Every interval of `source`, in the source's own frame.
    pub fn from_interval_source(source: &dyn IntervalSource) -> Result<Self, ConfigError> {
        if source.is_empty() {
            return Err(ConfigError::EmptySelectorSource(source.name().to_string()));
        }
        Ok(RowSelector::Interval {
            intervals: source.intervals().to_vec(),
            time_frame: source.time_frame().clone(),
        })
    }

    /// One timestamp row per event of `source`.
    pub fn timestamps_from_events(source: &dyn EventSource) -> Result<Self, ConfigError> {
        let (timestamps, time_frame) = event_rows(source)?;
        Ok(RowSelector::Timestamp { timestamps, time_frame })
    }

    /// One index row per event of `source`.
    pub fn indices_from_events(source: &dyn EventSource) -> Result<Self, ConfigError> {
        let (indices, time_frame) = event_rows(source)?;
        Ok(RowSelector::Index { indices, time_frame })
    }

    /// One timestamp row per sample of `frame`.
    pub fn timestamps_from_time_frame(frame: Arc<TimeFrame>) -> Self {
        RowSelector::Timestamp { timestamps: frame.indices().collect(), time_frame: frame }
    }

    pub fn indices_from_time_frame(frame: Arc<TimeFrame>) -> Self {
        RowSelector::Index { indices: frame.indices().collect(), time_frame: frame }
    }

    pub fn kind(&self) -> RowSelectorKind {
        match self {
            RowSelector::Index { .. } => RowSelectorKind::Index,
            RowSelector::Interval { .. } => RowSelectorKind::Interval,
            RowSelector::Timestamp { .. } => RowSelectorKind::Timestamp,
        }
    }

    pub fn time_frame(&self) -> &Arc<TimeFrame> {
        match self {
            RowSelector::Index { time_frame, .. }
            | RowSelector::Interval { time_frame, .. }
            | RowSelector::Timestamp { time_frame, .. } => time_frame,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RowSelector::Index { indices, .. } => indices.len(),
            RowSelector::Interval { intervals, .. } => intervals.len(),
            RowSelector::Timestamp { timestamps, .. } => timestamps.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// A selector keeping only the rows at `rows`. Out-of-range positions are skipped.
    pub fn filtered(&self, rows: &[usize]) -> Self {
        fn pick<T: Copy>(items: &[T], rows: &[usize]) -> Vec<T> {
            rows.iter().filter_map(|&r| items.get(r).copied()).collect()
        }
        match self {
            RowSelector::Index { indices, time_frame } => {
                RowSelector::Index { indices: pick(indices, rows), time_frame: time_frame.clone() }
            }
            RowSelector::Interval { intervals, time_frame } => {
                RowSelector::Interval { intervals: pick(intervals, rows), time_frame: time_frame.clone() }
            }
            RowSelector::Timestamp { timestamps, time_frame } => {
                RowSelector::Timestamp { timestamps: pick(timestamps, rows), time_frame: time_frame.clone() }
            }
        }
    }

    /// The plan before any entity expansion.
    pub fn to_plan(&self) -> ExecutionPlan {
        match self {
            RowSelector::Index { indices, time_frame } => ExecutionPlan::from_indices(indices.clone(), time_frame.clone()),
            RowSelector::Interval { intervals, time_frame } => {
                ExecutionPlan::from_intervals(intervals.clone(), time_frame.clone())
            }
            RowSelector::Timestamp { timestamps, time_frame } => {
                ExecutionPlan::from_indices(timestamps.clone(), time_frame.clone())
            }
        }
    }
}

fn event_rows(source: &dyn EventSource) -> Result<(Vec<TimeFrameIndex>, Arc<TimeFrame>), ConfigError> {
    if source.is_empty() {
        return Err(ConfigError::EmptySelectorSource(source.name().to_string()));
    }
    Ok((source.events().to_vec(), source.time_frame().clone()))
}
