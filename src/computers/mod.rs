//! Column computers: pure functions from an `ExecutionPlan` (plus a source and
//! parameters) to one or more typed output columns.
pub mod analog_offsets;
pub mod analog_slice;
pub mod event_in_interval;
pub mod interval_overlap;
pub mod interval_property;
pub mod interval_reduction;
pub mod line_sampling;
pub mod timestamp_in_interval;
pub mod timestamp_value;
pub mod value;

use smallvec::SmallVec;
use std::fmt;

use crate::error::ComputeError;
use crate::plan::{ExecutionPlan, RowSelectorKind};
use crate::sources::EntityId;

pub use value::{ColumnElement, ColumnValues, ElementType, ErasedColumn, ErasedComputer, MultiComputer, OutputType, SingleComputer};

/// Provenance of one output value. Most rows trace back to at most one record.
pub type EntityIds = SmallVec<[EntityId; 1]>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComputedColumn<T> {
    pub values: Vec<T>,
    /// One entry per row when the computer tracks provenance.
    pub entity_ids: Option<Vec<EntityIds>>,
}

impl<T> ComputedColumn<T> {
    pub fn untracked(values: Vec<T>) -> Self { Self { values, entity_ids: None } }
    pub fn tracked(values: Vec<T>, entity_ids: Vec<EntityIds>) -> Self { Self { values, entity_ids: Some(entity_ids) } }
}

pub trait ColumnComputer<T>: Send + Sync + fmt::Debug {
    /// Computes one value per plan row. Must fail on a plan of the wrong row kind
    /// and must return identical output when called again with the same plan.
    fn compute(&self, plan: &ExecutionPlan) -> Result<ComputedColumn<T>, ComputeError>;
    fn required_row_kind(&self) -> RowSelectorKind;
    /// Name of the source the computer reads.
    fn source_dependency(&self) -> &str;
}

pub trait MultiColumnComputer<T>: Send + Sync + fmt::Debug {
    /// Suffixes of the produced columns, in output order.
    fn output_suffixes(&self) -> Vec<String>;
    /// One column per suffix, computed in a single pass over the plan.
    fn compute_batch(&self, plan: &ExecutionPlan) -> Result<Vec<ComputedColumn<T>>, ComputeError>;
    fn required_row_kind(&self) -> RowSelectorKind;
    fn source_dependency(&self) -> &str;

    /// Entities available at each row of an unexpanded point plan. `None` when
    /// the computer produces exactly one value per row.
    fn entity_counts(&self, _plan: &ExecutionPlan) -> Option<Vec<usize>> { None }
}
