use std::path::PathBuf;
use thiserror::Error;

use crate::error::ConfigError;
use crate::table::TableError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cannot read configuration '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("No configuration loaded")]
    NotLoaded,
    #[error("Row selector: {0}")]
    RowSelector(#[source] ConfigError),
    #[error("Column '{column}': {source}")]
    Column {
        column: String,
        #[source]
        source: ConfigError,
    },
    #[error(transparent)]
    Build(#[from] TableError),
    #[error("Aborted by progress callback: {0}")]
    Aborted(String),
    #[error("Transform '{transform}' failed: {message}")]
    Transform { transform: String, message: String },
}
