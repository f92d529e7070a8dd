//! index.rs
//!
//! Strongly typed positions into a `TimeFrame`. An index is only meaningful
//! relative to the frame it was produced from.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

use super::frame::TimeFrameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TimeFrameIndex(pub i64);

impl TimeFrameIndex {
    #[inline(always)]
    pub fn value(&self) -> i64 { self.0 }
}

impl From<i64> for TimeFrameIndex {
    fn from(v: i64) -> Self { Self(v) }
}

impl Add<i64> for TimeFrameIndex {
    type Output = TimeFrameIndex;
    fn add(self, rhs: i64) -> Self::Output { TimeFrameIndex(self.0 + rhs) }
}

impl Sub for TimeFrameIndex {
    type Output = i64;
    fn sub(self, rhs: TimeFrameIndex) -> i64 { self.0 - rhs.0 }
}

impl fmt::Display for TimeFrameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// A closed `[start, end]` range of indices in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeFrameInterval {
    pub start: TimeFrameIndex,
    pub end: TimeFrameIndex,
}

impl TimeFrameInterval {
    pub fn new(start: impl Into<TimeFrameIndex>, end: impl Into<TimeFrameIndex>) -> Result<Self, TimeFrameError> {
        let (start, end) = (start.into(), end.into());
        if start > end {
            return Err(TimeFrameError::InvertedInterval { start: start.0, end: end.0 });
        }
        Ok(Self { start, end })
    }

    /// `end - start`, saturating at `i64::MAX` for intervals wider than an `i64`.
    pub fn duration(&self) -> i64 { self.end.0.saturating_sub(self.start.0) }

    /// Integer midpoint, rounded towards `start`.
    pub fn midpoint(&self) -> TimeFrameIndex {
        // start <= end, so the half width fits in an i64 and start + half stays within [start, end].
        let half = (self.end.0.abs_diff(self.start.0) / 2) as i64;
        TimeFrameIndex(self.start.0 + half)
    }

    pub fn contains(&self, idx: TimeFrameIndex) -> bool {
        self.start <= idx && idx <= self.end
    }

    pub fn contains_interval(&self, other: &TimeFrameInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &TimeFrameInterval) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for TimeFrameInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "[{}, {}]", self.start, self.end) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_inverted_interval_is_rejected() {
        assert_eq!(
            TimeFrameInterval::new(5, 4),
            Err(TimeFrameError::InvertedInterval { start: 5, end: 4 })
        );
        assert!(TimeFrameInterval::new(4, 4).is_ok());
    }

    #[rstest]
    #[case((1, 3), (0, 2), true)]
    #[case((1, 3), (3, 4), true)] // Closed on both ends
    #[case((1, 3), (4, 9), false)]
    #[case((6, 8), (9, 9), false)]
    fn test_overlap_rule(#[case] a: (i64, i64), #[case] b: (i64, i64), #[case] expected: bool) {
        let a = TimeFrameInterval::new(a.0, a.1).unwrap();
        let b = TimeFrameInterval::new(b.0, b.1).unwrap();
        assert_eq!(a.overlaps(&b), expected);
        assert_eq!(b.overlaps(&a), expected);
    }

    #[test]
    fn test_midpoint_and_duration() {
        let iv = TimeFrameInterval::new(10, 15).unwrap();
        assert_eq!(iv.duration(), 5);
        assert_eq!(iv.midpoint(), TimeFrameIndex(12));
        assert!(iv.contains(TimeFrameIndex(15)));
        assert!(!iv.contains(TimeFrameIndex(16)));
    }

    #[rstest]
    #[case((i64::MIN, i64::MAX), i64::MAX, -1)]
    #[case((i64::MIN, 0), i64::MAX, i64::MIN / 2)]
    #[case((i64::MAX - 1, i64::MAX), 1, i64::MAX - 1)]
    #[case((-3, 0), 3, -2)]
    fn test_extreme_bounds_do_not_overflow(#[case] bounds: (i64, i64), #[case] duration: i64, #[case] midpoint: i64) {
        let iv = TimeFrameInterval::new(bounds.0, bounds.1).unwrap();
        assert_eq!(iv.duration(), duration);
        assert_eq!(iv.midpoint(), TimeFrameIndex(midpoint));
    }
}
