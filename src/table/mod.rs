//! Table assembly and storage.
pub mod builder;
pub mod registry;

use thiserror::Error;

use crate::computers::OutputType;
use crate::error::ComputeError;

pub use builder::{BuiltColumn, BuiltTable, TableBuilder};
pub use registry::{TableInfo, TableRegistry};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Table must have at least one column")]
    NoColumns,
    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),
    #[error("Column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch { column: String, expected: usize, actual: usize },
    #[error("Column '{0}' not found")]
    UnknownColumn(String),
    #[error("Column '{column}' holds {actual} values, not {expected}")]
    TypeMismatch { column: String, expected: OutputType, actual: OutputType },
    #[error("Column '{column}': {source}")]
    Compute {
        column: String,
        #[source]
        source: ComputeError,
    },
}
