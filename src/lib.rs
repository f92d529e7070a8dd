//! Tabular views over time-series data.
//!
//! Sources (analog, event, interval, line) share `TimeFrame`s. A row selector
//! picks the rows of a table, column computers fill its columns, and the JSON
//! pipeline builds whole sets of tables from configuration.
pub mod computers;
pub mod error;
pub mod pipeline;
pub mod plan;
pub mod registry;
pub mod sources;
pub mod table;
pub mod time;

#[cfg(feature = "python")]
mod bindings {
    pub mod python;
}

pub use error::{ComputeError, ConfigError};
pub use pipeline::{PipelineError, PipelineResult, TablePipeline};
pub use plan::{ExecutionPlan, RowSelector, RowSelectorKind};
pub use registry::{build_registry, ComputerRegistry};
pub use sources::{DataCatalog, DataSourceVariant};
pub use table::{BuiltTable, TableBuilder, TableRegistry};
pub use time::{TimeFrame, TimeFrameIndex, TimeFrameInterval};
