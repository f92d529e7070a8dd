//! Crate-wide error types shared by computers, the registry and the pipeline.
//!
//! `ComputeError` signals a broken precondition: a computer was handed a plan
//! or an operation it can never serve. `ConfigError` signals a recoverable
//! configuration problem that aborts one table build.
use thiserror::Error;

use crate::plan::{PlanRowKind, RowSelectorKind};
use crate::sources::{RawDataType, SourceKind};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    #[error("Computer '{computer}' requires {expected} rows but the plan holds {actual} rows")]
    RowKindMismatch { computer: String, expected: RowSelectorKind, actual: PlanRowKind },
    #[error("Computer '{computer}': operation {operation} cannot produce {output_type} values")]
    OperationTypeMismatch { computer: String, operation: String, output_type: &'static str },
    #[error("Computer '{computer}' produced {actual} values for a plan of {expected} rows")]
    LengthMismatch { computer: String, expected: usize, actual: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown computer '{0}'")]
    UnknownComputer(String),
    #[error("Unknown adapter '{0}'")]
    UnknownAdapter(String),
    #[error("Data source '{0}' not found")]
    UnknownDataSource(String),
    #[error("Time frame '{0}' not found")]
    UnknownTimeFrame(String),
    #[error("Computer '{computer}' requires a {expected} source, got {actual}")]
    SourceKindMismatch { computer: String, expected: SourceKind, actual: SourceKind },
    #[error("Computer '{computer}' requires a {expected} row selector, got {actual}")]
    RowSelectorMismatch { computer: String, expected: RowSelectorKind, actual: RowSelectorKind },
    #[error("Adapter '{adapter}' expects {expected} data, got {actual}")]
    AdapterInputMismatch { adapter: String, expected: RawDataType, actual: RawDataType },
    #[error("Invalid parameter '{parameter}' for '{computer}': {message}")]
    InvalidParameter { computer: String, parameter: String, message: String },
    #[error("Cannot build rows from '{0}': it holds no records")]
    EmptySelectorSource(String),
    #[error("Invalid row selector: {0}")]
    InvalidRowSelector(String),
    #[error(transparent)]
    Compute(#[from] ComputeError),
}
