//! frame.rs
//!
//! A `TimeFrame` maps sample positions to absolute integer times. Every data
//! source owns one, and all cross-source queries travel through absolute time.
use std::ptr;
use thiserror::Error;

use super::index::{TimeFrameIndex, TimeFrameInterval};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeFrameError {
    #[error("A time frame needs at least one sample")]
    Empty,
    #[error("Time values must be strictly increasing (position {position}: {previous} -> {current})")]
    NotIncreasing { position: usize, previous: i64, current: i64 },
    #[error("Interval start {start} is after its end {end}")]
    InvertedInterval { start: i64, end: i64 },
    #[error("Step must be positive, got {0}")]
    InvalidStep(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeFrame {
    times: Vec<i64>,
}

impl TimeFrame {
    pub fn new(times: Vec<i64>) -> Result<Self, TimeFrameError> {
        if times.is_empty() {
            return Err(TimeFrameError::Empty);
        }
        if let Some(pos) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(TimeFrameError::NotIncreasing {
                position: pos + 1,
                previous: times[pos],
                current: times[pos + 1],
            });
        }
        Ok(Self { times })
    }

    /// `count` samples starting at `start`, spaced `step` apart.
    pub fn from_range(start: i64, count: usize, step: i64) -> Result<Self, TimeFrameError> {
        if step <= 0 {
            return Err(TimeFrameError::InvalidStep(step));
        }
        Self::new((0..count as i64).map(|i| start + i * step).collect())
    }

    pub fn len(&self) -> usize { self.times.len() }
    pub fn is_empty(&self) -> bool { self.times.is_empty() }
    pub fn times(&self) -> &[i64] { &self.times }

    pub fn first_index(&self) -> TimeFrameIndex { TimeFrameIndex(0) }
    pub fn last_index(&self) -> TimeFrameIndex { TimeFrameIndex(self.times.len() as i64 - 1) }

    /// Every index of the frame, in order.
    pub fn indices(&self) -> impl Iterator<Item = TimeFrameIndex> + '_ {
        (0..self.times.len() as i64).map(TimeFrameIndex)
    }

    /// Absolute time of a sample. Indices outside the frame clamp to the
    /// first or last sample.
    #[inline]
    pub fn time_at_index(&self, idx: TimeFrameIndex) -> i64 {
        let last = self.times.len() - 1;
        let pos = idx.0.clamp(0, last as i64) as usize;
        self.times[pos]
    }

    /// Index of the sample nearest to `time`.
    ///
    /// When `time` falls exactly halfway between two samples the earlier one
    /// wins. Times outside the frame clamp to the first or last sample.
    pub fn index_at_time(&self, time: i64) -> TimeFrameIndex {
        let upper = self.times.partition_point(|&t| t < time);
        if upper == 0 {
            return TimeFrameIndex(0);
        }
        if upper == self.times.len() {
            return self.last_index();
        }
        if self.times[upper] == time {
            return TimeFrameIndex(upper as i64);
        }
        let lower = upper - 1;
        let pick = if time - self.times[lower] <= self.times[upper] - time { lower } else { upper };
        TimeFrameIndex(pick as i64)
    }
}

/// Re-expresses an index of frame `from` as the nearest index of frame `to`.
pub fn convert_index(idx: TimeFrameIndex, from: &TimeFrame, to: &TimeFrame) -> TimeFrameIndex {
    if ptr::eq(from, to) {
        return idx;
    }
    to.index_at_time(from.time_at_index(idx))
}

pub fn convert_interval(iv: &TimeFrameInterval, from: &TimeFrame, to: &TimeFrame) -> TimeFrameInterval {
    // Conversion is monotone, so start <= end survives it.
    TimeFrameInterval {
        start: convert_index(iv.start, from, to),
        end: convert_index(iv.end, from, to),
    }
}
