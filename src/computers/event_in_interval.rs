//! event_in_interval.rs
//!
//! Presence, count and gathering of events inside each row interval. One
//! generic implementation serves every output type; which operations a type
//! can carry is decided by `EventOutput`.
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{ColumnComputer, ColumnElement, ComputedColumn, EntityIds};
use crate::error::ComputeError;
use crate::plan::{ExecutionPlan, RowSelectorKind};
use crate::sources::EventSource;
use crate::time::{convert_index, TimeFrameIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOperation {
    Presence,
    Count,
    Gather,
    GatherCentered,
}

impl EventOperation {
    fn gathers(&self) -> bool {
        matches!(self, EventOperation::Gather | EventOperation::GatherCentered)
    }
}

impl fmt::Display for EventOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Debug::fmt(self, f) }
}

pub trait EventOutput: ColumnElement {
    fn supports(op: EventOperation) -> bool;
    /// Builds a row value from the source-frame events inside the row. `origin`
    /// is subtracted from gathered positions.
    fn from_events(events: &[TimeFrameIndex], origin: TimeFrameIndex) -> Self;
}

impl EventOutput for bool {
    fn supports(op: EventOperation) -> bool { op == EventOperation::Presence }
    fn from_events(events: &[TimeFrameIndex], _: TimeFrameIndex) -> Self { !events.is_empty() }
}

impl EventOutput for i32 {
    fn supports(op: EventOperation) -> bool { op == EventOperation::Count }
    fn from_events(events: &[TimeFrameIndex], _: TimeFrameIndex) -> Self { events.len() as i32 }
}

impl EventOutput for Vec<f32> {
    fn supports(op: EventOperation) -> bool { op.gathers() }
    fn from_events(events: &[TimeFrameIndex], origin: TimeFrameIndex) -> Self {
        events.iter().map(|&e| (e - origin) as f32).collect()
    }
}

impl EventOutput for Vec<TimeFrameIndex> {
    fn supports(op: EventOperation) -> bool { op.gathers() }
    fn from_events(events: &[TimeFrameIndex], origin: TimeFrameIndex) -> Self {
        events.iter().map(|&e| TimeFrameIndex(e - origin)).collect()
    }
}

#[derive(Debug)]
pub struct EventInIntervalComputer<T> {
    source: Arc<dyn EventSource>,
    operation: EventOperation,
    source_name: String,
    _output: PhantomData<fn() -> T>,
}

impl<T: EventOutput> EventInIntervalComputer<T> {
    pub fn new(source: Arc<dyn EventSource>, operation: EventOperation, source_name: impl Into<String>) -> Result<Self, ComputeError> {
        let source_name = source_name.into();
        if !T::supports(operation) {
            return Err(ComputeError::OperationTypeMismatch {
                computer: source_name,
                operation: operation.to_string(),
                output_type: T::OUTPUT_TYPE.name(),
            });
        }
        Ok(Self { source, operation, source_name, _output: PhantomData })
    }
}

impl<T: EventOutput> ColumnComputer<T> for EventInIntervalComputer<T> {
    fn compute(&self, plan: &ExecutionPlan) -> Result<ComputedColumn<T>, ComputeError> {
        let intervals = plan.require_intervals(&self.source_name)?;
        let dest = plan.time_frame();
        let own = self.source.time_frame();
        let events = self.source.events();
        let ids = self.source.entity_ids();

        let mut values = Vec::with_capacity(intervals.len());
        let mut entity_ids: Vec<EntityIds> = Vec::new();
        for iv in intervals {
            let range = self.source.events_in_range(iv.start, iv.end, dest);
            let origin = match self.operation {
                EventOperation::GatherCentered => convert_index(iv.midpoint(), dest, own),
                _ => TimeFrameIndex(0),
            };
            values.push(T::from_events(&events[range.clone()], origin));
            if self.operation.gathers() {
                entity_ids.push(ids[range].iter().copied().collect());
            }
        }

        if self.operation.gathers() {
            Ok(ComputedColumn::tracked(values, entity_ids))
        } else {
            Ok(ComputedColumn::untracked(values))
        }
    }

    fn required_row_kind(&self) -> RowSelectorKind { RowSelectorKind::Interval }
    fn source_dependency(&self) -> &str { &self.source_name }
}
