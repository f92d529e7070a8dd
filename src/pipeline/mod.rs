//! mod.rs
//!
//! The JSON-driven table pipeline. A pipeline is loaded once from a
//! configuration document, then executed: every configured table is built in
//! order and stored in a `TableRegistry`, followed by its post-build
//! transforms. The run stops at the first table that fails.
pub mod config;
pub mod error;
pub mod transforms;

use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::computers::ErasedComputer;
use crate::error::ConfigError;
use crate::plan::{RowSelector, RowSelectorKind};
use crate::registry::ComputerRegistry;
use crate::sources::{DataCatalog, DataSourceVariant, DEFAULT_TIME_FRAME};
use crate::table::{BuiltTable, TableBuilder, TableRegistry};
use crate::time::{TimeFrame, TimeFrameIndex, TimeFrameInterval};

pub use config::{ColumnConfig, DataSourceRef, PipelineConfig, RowSelectorConfig, TableConfig, TransformConfig};
pub use error::PipelineError;
pub use transforms::{PcaConfig, TransformError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Empty,
    Loaded,
    Built,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableResult {
    pub table_id: String,
    pub success: bool,
    /// Columns whose computers were constructed, including those before a failure.
    pub columns_built: usize,
    pub total_columns: usize,
    pub error: Option<String>,
    pub build_time_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineResult {
    pub success: bool,
    pub error_message: Option<String>,
    pub tables_completed: usize,
    pub total_tables: usize,
    pub table_results: Vec<TableResult>,
    pub total_execution_time_ms: f64,
}

/// Snapshot handed to the progress callback between columns and between tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineProgress {
    pub table_index: usize,
    pub table_name: String,
    /// Fraction of the current table's columns prepared, in `[0, 1]`.
    pub table_progress: f64,
    /// Fraction of the whole run, in `[0, 1]`.
    pub overall_progress: f64,
    pub message: String,
}

/// Progress observer. Returning `Err` aborts the table being built.
pub type ProgressCallback<'c> = &'c mut dyn FnMut(&PipelineProgress) -> Result<(), String>;

pub struct TablePipeline<'a> {
    registry: &'a ComputerRegistry,
    catalog: &'a DataCatalog,
    tables: &'a mut TableRegistry,
    configs: Vec<TableConfig>,
    metadata: Value,
    state: PipelineState,
}

impl<'a> TablePipeline<'a> {
    pub fn new(registry: &'a ComputerRegistry, catalog: &'a DataCatalog, tables: &'a mut TableRegistry) -> Self {
        Self { registry, catalog, tables, configs: Vec::new(), metadata: Value::Null, state: PipelineState::Empty }
    }

    pub fn state(&self) -> PipelineState { self.state }
    pub fn table_configs(&self) -> &[TableConfig] { &self.configs }
    pub fn metadata(&self) -> &Value { &self.metadata }
    pub fn tables(&self) -> &TableRegistry { &*self.tables }

    pub fn clear(&mut self) {
        self.configs.clear();
        self.metadata = Value::Null;
        self.state = PipelineState::Empty;
    }

    // --- Loading ---

    /// Validates and loads a configuration document, replacing any previous one.
    pub fn load_from_json(&mut self, root: &Value) -> Result<(), PipelineError> {
        let errors = config::validate(root);
        if !errors.is_empty() {
            for message in &errors {
                log::warn!("Pipeline configuration: {}", message);
            }
            return Err(PipelineError::Validation(errors));
        }
        let parsed: PipelineConfig = serde_json::from_value(root.clone())?;
        log::info!("Loaded pipeline configuration with {} table(s)", parsed.tables.len());
        self.configs = parsed.tables;
        self.metadata = parsed.metadata;
        self.state = PipelineState::Loaded;
        Ok(())
    }

    pub fn load_from_json_str(&mut self, text: &str) -> Result<(), PipelineError> {
        let root: Value = serde_json::from_str(text)?;
        self.load_from_json(&root)
    }

    pub fn load_from_json_file(&mut self, path: impl AsRef<Path>) -> Result<(), PipelineError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Io { path: path.to_path_buf(), source })?;
        self.load_from_json_str(&text)
    }

    // --- Execution ---

    /// Builds every loaded table in configuration order.
    ///
    /// A table reaches the registry only once it built completely. On the first
    /// failure the run stops; tables stored before it stay stored.
    pub fn execute(&mut self, mut progress: Option<ProgressCallback<'_>>) -> PipelineResult {
        let started = Instant::now();
        let mut result = PipelineResult { total_tables: self.configs.len(), ..Default::default() };

        if self.state == PipelineState::Empty {
            result.error_message = Some(PipelineError::NotLoaded.to_string());
            return result;
        }

        let total = self.configs.len();
        let mut failed = false;
        for (index, config) in self.configs.iter().enumerate() {
            let table_started = Instant::now();
            let mut table_result = TableResult {
                table_id: config.table_id.clone(),
                total_columns: config.columns.len(),
                ..Default::default()
            };

            let built = self.build_table(index, total, config, &mut progress, &mut table_result.columns_built);
            match built {
                Ok(table) => {
                    table_result.success = true;
                    log::info!(
                        "Built table '{}': {} rows, {} columns",
                        config.table_id,
                        table.row_count(),
                        table.column_count()
                    );
                    commit(self.tables, config, table);
                    apply_transforms(self.tables, config);
                    result.tables_completed += 1;
                }
                Err(e) => {
                    let message = format!("Failed to build table '{}': {}", config.table_id, e);
                    log::warn!("{}", message);
                    table_result.error = Some(e.to_string());
                    result.error_message = Some(message);
                    failed = true;
                }
            }

            table_result.build_time_ms = table_started.elapsed().as_secs_f64() * 1000.0;
            result.table_results.push(table_result);
            if failed {
                break;
            }

            let done = PipelineProgress {
                table_index: index,
                table_name: config.name.clone(),
                table_progress: 1.0,
                overall_progress: (index + 1) as f64 / total as f64,
                message: format!("Completed table '{}'", config.table_id),
            };
            // The table is already stored, so a refusal here cannot undo it.
            if let Err(message) = report(&mut progress, &done) {
                log::warn!("Ignoring progress error after table '{}': {}", config.table_id, message);
            }
        }

        result.success = !failed;
        self.state = if failed { PipelineState::Failed } else { PipelineState::Built };
        result.total_execution_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        result
    }

    fn build_table(
        &self,
        index: usize,
        total: usize,
        config: &TableConfig,
        progress: &mut Option<ProgressCallback<'_>>,
        columns_built: &mut usize,
    ) -> Result<BuiltTable, PipelineError> {
        // 1. Rows
        let selector = self.resolve_row_selector(&config.row_selector).map_err(PipelineError::RowSelector)?;
        let selector_kind = selector.kind();
        let mut builder = TableBuilder::new(selector);

        // 2. Columns
        let columns = config.columns.len();
        for (position, column) in config.columns.iter().enumerate() {
            let table_progress = position as f64 / columns as f64;
            let update = PipelineProgress {
                table_index: index,
                table_name: config.name.clone(),
                table_progress,
                overall_progress: (index as f64 + table_progress) / total as f64,
                message: format!("Adding column '{}'", column.name),
            };
            report(progress, &update).map_err(PipelineError::Aborted)?;

            let computer = self
                .create_column_computer(column, selector_kind)
                .map_err(|source| PipelineError::Column { column: column.name.clone(), source })?;
            builder.add_erased(column.name.clone(), computer);
            *columns_built += 1;
        }

        // 3. Values
        Ok(builder.build()?)
    }

    fn create_column_computer(&self, column: &ColumnConfig, selector: RowSelectorKind) -> Result<ErasedComputer, ConfigError> {
        let source = self.resolve_data_source(&column.data_source)?;
        self.registry.create_computer_for(&column.computer, selector, &source, &column.params())
    }

    fn resolve_data_source(&self, reference: &DataSourceRef) -> Result<DataSourceVariant, ConfigError> {
        match reference {
            DataSourceRef::Key(key) => self.catalog.resolve(key).ok_or_else(|| ConfigError::UnknownDataSource(key.clone())),
            DataSourceRef::Adapted { key, adapter, parameters } => {
                let raw = self.catalog.raw(key).ok_or_else(|| ConfigError::UnknownDataSource(key.clone()))?;
                self.registry.create_adapter(adapter, raw, key, &config::to_params(parameters))
            }
        }
    }

    fn resolve_time_frame(&self, key: Option<&str>) -> Result<Arc<TimeFrame>, ConfigError> {
        let frame = match key {
            Some(key) => self.catalog.time_frame(key),
            None => self.catalog.default_time_frame(),
        };
        frame.cloned().ok_or_else(|| ConfigError::UnknownTimeFrame(key.unwrap_or(DEFAULT_TIME_FRAME).to_string()))
    }

    fn resolve_row_selector(&self, config: &RowSelectorConfig) -> Result<RowSelector, ConfigError> {
        let source_key = || {
            config.source.as_deref().ok_or_else(|| {
                ConfigError::InvalidRowSelector(format!("'{}' selector needs a 'source' or a literal list", config.kind))
            })
        };

        match config.kind.as_str() {
            "interval" => {
                if let Some(literals) = &config.intervals {
                    if literals.is_empty() {
                        return Err(ConfigError::InvalidRowSelector("'intervals' is empty".to_string()));
                    }
                    let intervals = literals
                        .iter()
                        .map(|literal| {
                            let (start, end) = literal.bounds();
                            TimeFrameInterval::new(start, end).map_err(|e| ConfigError::InvalidRowSelector(e.to_string()))
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    let time_frame = self.resolve_time_frame(config.timeframe.as_deref())?;
                    return Ok(RowSelector::Interval { intervals, time_frame });
                }
                let key = source_key()?;
                let source = self.catalog.intervals(key).ok_or_else(|| ConfigError::UnknownDataSource(key.to_string()))?;
                RowSelector::from_interval_source(source.as_ref())
            }
            "timestamp" => {
                if let Some(numbers) = &config.timestamps {
                    let timestamps = config::whole_numbers(numbers).into_iter().map(TimeFrameIndex).collect();
                    let time_frame = self.resolve_time_frame(config.timeframe.as_deref())?;
                    return Ok(RowSelector::Timestamp { timestamps, time_frame });
                }
                let key = source_key()?;
                if let Some(events) = self.catalog.events(key) {
                    return RowSelector::timestamps_from_events(events.as_ref());
                }
                let frame = self.catalog.time_frame(key).ok_or_else(|| ConfigError::UnknownDataSource(key.to_string()))?;
                Ok(RowSelector::timestamps_from_time_frame(frame.clone()))
            }
            "index" => {
                if let Some(numbers) = &config.indices {
                    let indices = config::whole_numbers(numbers).into_iter().map(TimeFrameIndex).collect();
                    let time_frame = self.resolve_time_frame(config.timeframe.as_deref())?;
                    return Ok(RowSelector::Index { indices, time_frame });
                }
                let key = source_key()?;
                if let Some(events) = self.catalog.events(key) {
                    return RowSelector::indices_from_events(events.as_ref());
                }
                let frame = self.catalog.time_frame(key).ok_or_else(|| ConfigError::UnknownDataSource(key.to_string()))?;
                Ok(RowSelector::indices_from_time_frame(frame.clone()))
            }
            other => Err(ConfigError::InvalidRowSelector(format!("unknown type '{}'", other))),
        }
    }
}

fn report(progress: &mut Option<ProgressCallback<'_>>, update: &PipelineProgress) -> Result<(), String> {
    match progress {
        Some(callback) => callback(update),
        None => Ok(()),
    }
}

/// Stores a finished table together with its descriptive info.
fn commit(tables: &mut TableRegistry, config: &TableConfig, table: BuiltTable) {
    let id = &config.table_id;
    if tables.has_table(id) {
        tables.update_table_info(id, &config.name, &config.description);
    } else {
        tables.create_table(id, &config.name, &config.description);
    }
    tables.set_tags(id, config.tags.clone());
    tables.store_built_table(id, table);
}

/// Runs the table's transforms. Failures are logged and never undo the base table.
fn apply_transforms(tables: &mut TableRegistry, config: &TableConfig) {
    if config.transforms.is_empty() {
        return;
    }
    let Some(base) = tables.built_table(&config.table_id) else {
        log::warn!("Cannot apply transforms: table '{}' was not stored", config.table_id);
        return;
    };
    for transform in &config.transforms {
        match run_transform(tables, config, &base, transform) {
            Ok(output_id) => log::info!("Stored {} of '{}' as '{}'", transform.kind, config.table_id, output_id),
            Err(e) => log::warn!("Table '{}': {}", config.table_id, e),
        }
    }
}

fn run_transform(
    tables: &mut TableRegistry,
    config: &TableConfig,
    base: &BuiltTable,
    transform: &TransformConfig,
) -> Result<String, PipelineError> {
    let failed = |message: String| PipelineError::Transform { transform: transform.kind.clone(), message };
    if transform.kind != transforms::PCA {
        return Err(failed("unknown transform type".to_string()));
    }
    let derived = transforms::pca(base, &PcaConfig::from_parameters(&transform.parameters)).map_err(|e| failed(e.to_string()))?;

    let output_id = match transform.output_table_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => tables.generate_unique_table_id(&format!("{}_pca", config.table_id)),
    };
    let output_name = match transform.output_name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{} (PCA)", config.name),
    };
    let description = transform.output_description.clone().unwrap_or_default();

    if tables.has_table(&output_id) {
        tables.update_table_info(&output_id, &output_name, &description);
    } else {
        tables.create_table(&output_id, &output_name, &description);
    }
    tables.store_built_table(&output_id, derived);
    Ok(output_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::build_registry;
    use crate::sources::{AnalogSeries, EventSeries, IntervalSeries, Point, PointSeries, RawData};
    use rstest::rstest;
    use serde_json::json;
    use std::io::Write;

    fn catalog() -> DataCatalog {
        let frame = Arc::new(TimeFrame::from_range(0, 101, 1).unwrap());
        let coarse = Arc::new(TimeFrame::from_range(0, 51, 2).unwrap());
        let points = PointSeries::new(
            "pos",
            frame.clone(),
            vec![TimeFrameIndex(0), TimeFrameIndex(1), TimeFrameIndex(2)],
            vec![Point::new(1.0, 10.0), Point::new(2.0, 20.0), Point::new(3.0, 30.0)],
        )
        .unwrap();
        let trials = IntervalSeries::new(
            "trials",
            frame.clone(),
            vec![TimeFrameInterval::new(0, 4).unwrap(), TimeFrameInterval::new(10, 14).unwrap()],
        );

        let mut catalog = DataCatalog::new();
        catalog
            .add_time_frame(DEFAULT_TIME_FRAME, frame.clone())
            .add_time_frame("coarse", coarse.clone())
            .add_analog("lfp", Arc::new(AnalogSeries::dense("lfp", frame.clone(), (0..101).map(f64::from).collect())))
            .add_events("licks", Arc::new(EventSeries::new("licks", frame.clone(), vec![TimeFrameIndex(2), TimeFrameIndex(3), TimeFrameIndex(12)])))
            .add_events("rewards", Arc::new(EventSeries::new("rewards", coarse, vec![TimeFrameIndex(6)])))
            .add_intervals("trials", Arc::new(trials))
            .add_raw("pos", RawData::Points(Arc::new(points)));
        catalog
    }

    fn trial_table() -> Value {
        json!({
            "table_id": "trials",
            "name": "Trials",
            "tags": ["behavior"],
            "row_selector": { "type": "interval", "source": "trials" },
            "columns": [
                { "name": "Mean", "computer": "Interval Mean", "data_source": "lfp" },
                { "name": "Licks", "computer": "Event Count", "data_source": "licks" },
                { "name": "Rewards", "computer": "Event Count", "data_source": "rewards" },
                { "name": "Duration", "computer": "Interval Duration", "data_source": "trials" }
            ],
            "transforms": [
                { "type": "PCA", "parameters": { "exclude": ["Duration"] } },
                { "type": "Whitening" }
            ]
        })
    }

    fn position_table() -> Value {
        json!({
            "table_id": "position",
            "name": "Position",
            "row_selector": { "type": "timestamp", "timestamps": [0, 2, 5] },
            "columns": [
                { "name": "X", "computer": "Timestamp Value",
                  "data_source": { "key": "pos", "adapter": "Point X Component" } }
            ]
        })
    }

    #[test]
    fn test_end_to_end_build() {
        let registry = build_registry();
        let catalog = catalog();
        let mut tables = TableRegistry::new();
        let mut pipeline = TablePipeline::new(&registry, &catalog, &mut tables);
        pipeline
            .load_from_json(&json!({ "metadata": { "session": "s1" }, "tables": [trial_table(), position_table()] }))
            .unwrap();
        assert_eq!(pipeline.state(), PipelineState::Loaded);
        assert_eq!(pipeline.metadata()["session"], "s1");

        let result = pipeline.execute(None);
        assert!(result.success, "{:?}", result.error_message);
        assert_eq!(result.tables_completed, 2);
        assert_eq!(result.table_results[0].columns_built, 4);
        assert_eq!(pipeline.state(), PipelineState::Built);

        let trials = tables.built_table("trials").unwrap();
        assert_eq!(trials.values::<f64>("Mean").unwrap(), &[2.0, 12.0]);
        assert_eq!(trials.values::<i32>("Licks").unwrap(), &[2, 1]);
        // Coarse event 6 sits at time 12, inside the fine interval [10, 14].
        assert_eq!(trials.values::<i32>("Rewards").unwrap(), &[0, 1]);
        assert_eq!(trials.values::<f64>("Duration").unwrap(), &[4.0, 4.0]);
        assert_eq!(tables.table_info("trials").unwrap().tags, vec!["behavior"]);

        let position = tables.built_table("position").unwrap();
        let x = position.values::<f64>("X").unwrap();
        assert_eq!(&x[..2], &[1.0, 3.0]);
        assert!(x[2].is_nan());
    }

    #[test]
    fn test_pca_transform_registers_derived_table() {
        let registry = build_registry();
        let catalog = catalog();
        let mut tables = TableRegistry::new();
        tables.create_table("trials_pca", "Taken", "");
        let mut pipeline = TablePipeline::new(&registry, &catalog, &mut tables);
        pipeline.load_from_json(&json!({ "tables": [trial_table()] })).unwrap();
        assert!(pipeline.execute(None).success);

        let info = tables.table_info("trials_pca_1").unwrap();
        assert_eq!(info.name, "Trials (PCA)");
        assert_eq!(info.column_names, vec!["PC1", "PC2", "PC3"]);
        assert_eq!(info.row_count, 2);
        assert!(tables.built_table("trials_pca").is_none());
    }

    #[rstest]
    #[case(json!({ "name": "Bad", "computer": "Nope", "data_source": "lfp" }), "Unknown computer 'Nope'")]
    #[case(json!({ "name": "Bad", "computer": "Interval Mean", "data_source": "missing" }), "Data source 'missing' not found")]
    #[case(json!({ "name": "Bad", "computer": "Interval Mean", "data_source": "licks" }), "requires a analog source")]
    #[case(json!({ "name": "Bad", "computer": "Timestamp Value", "data_source": "lfp" }), "requires a timestamp row selector")]
    fn test_failing_table_stops_run(#[case] column: Value, #[case] expected: &str) {
        let registry = build_registry();
        let catalog = catalog();
        let mut tables = TableRegistry::new();
        let bad = json!({
            "table_id": "bad",
            "name": "Bad",
            "row_selector": { "type": "interval", "intervals": [[0, 4]] },
            "columns": [{ "name": "Mean", "computer": "Interval Mean", "data_source": "lfp" }, column]
        });
        let mut pipeline = TablePipeline::new(&registry, &catalog, &mut tables);
        pipeline.load_from_json(&json!({ "tables": [position_table(), bad, trial_table()] })).unwrap();

        let result = pipeline.execute(None);
        assert!(!result.success);
        assert_eq!(result.tables_completed, 1);
        assert_eq!(result.table_results.len(), 2);
        let message = result.error_message.unwrap();
        assert!(message.starts_with("Failed to build table 'bad': Column 'Bad'"), "{}", message);
        assert!(message.contains(expected), "{}", message);
        assert_eq!(pipeline.state(), PipelineState::Failed);

        assert_eq!(result.table_results[1].columns_built, 1);
        assert!(tables.has_table("position"));
        assert!(!tables.has_table("bad"));
        assert!(!tables.has_table("trials"));
    }

    #[test]
    fn test_failed_table_counts_columns_built_before_error() {
        let registry = build_registry();
        let catalog = catalog();
        let mut tables = TableRegistry::new();
        let config = json!({ "tables": [{
            "table_id": "partial",
            "name": "Partial",
            "row_selector": { "type": "interval", "source": "trials" },
            "columns": [
                { "name": "Mean", "computer": "Interval Mean", "data_source": "lfp" },
                { "name": "Licks", "computer": "Event Count", "data_source": "licks" },
                { "name": "Bad", "computer": "Nope", "data_source": "lfp" }
            ]
        }]});
        let mut pipeline = TablePipeline::new(&registry, &catalog, &mut tables);
        pipeline.load_from_json(&config).unwrap();

        let result = pipeline.execute(None);
        assert!(!result.success);
        let table = &result.table_results[0];
        assert!(!table.success);
        assert_eq!(table.columns_built, 2);
        assert_eq!(table.total_columns, 3);
    }

    #[test]
    fn test_progress_callback_can_abort() {
        let registry = build_registry();
        let catalog = catalog();
        let mut tables = TableRegistry::new();
        let mut pipeline = TablePipeline::new(&registry, &catalog, &mut tables);
        pipeline.load_from_json(&json!({ "tables": [trial_table()] })).unwrap();

        let mut seen = Vec::new();
        let callback: ProgressCallback<'_> = &mut |p: &PipelineProgress| {
            seen.push(p.message.clone());
            if p.message.contains("Licks") { Err("cancelled".to_string()) } else { Ok(()) }
        };
        let result = pipeline.execute(Some(callback));
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("Failed to build table 'trials': Aborted by progress callback: cancelled"));
        assert_eq!(seen, vec!["Adding column 'Mean'", "Adding column 'Licks'"]);
        assert_eq!(result.table_results[0].columns_built, 1);
        assert!(!tables.has_table("trials"));
    }

    #[test]
    fn test_progress_error_after_table_is_ignored() {
        let registry = build_registry();
        let catalog = catalog();
        let mut tables = TableRegistry::new();
        let mut pipeline = TablePipeline::new(&registry, &catalog, &mut tables);
        pipeline.load_from_json(&json!({ "tables": [position_table(), trial_table()] })).unwrap();

        let mut completed = 0;
        let callback: ProgressCallback<'_> = &mut |p: &PipelineProgress| {
            if p.message.starts_with("Completed") {
                completed += 1;
                return Err("too late".to_string());
            }
            Ok(())
        };
        let result = pipeline.execute(Some(callback));
        assert_eq!(completed, 2);
        assert!(result.success, "{:?}", result.error_message);
        assert!(result.error_message.is_none());
        assert_eq!(result.tables_completed, 2);
        assert!(result.table_results.iter().all(|t| t.success));
        assert_eq!(pipeline.state(), PipelineState::Built);
        assert!(tables.has_table("position"));
        assert!(tables.has_table("trials"));
    }

    #[test]
    fn test_explicit_selectors_and_frames() {
        let registry = build_registry();
        let catalog = catalog();
        let mut tables = TableRegistry::new();
        let config = json!({ "tables": [
            { "table_id": "by_index", "name": "Index",
              "row_selector": { "type": "index", "source": "licks" },
              "columns": [{ "name": "V", "computer": "Index Value", "data_source": "lfp" }] },
            { "table_id": "by_frame", "name": "Frame",
              "row_selector": { "type": "timestamp", "source": "coarse" },
              "columns": [{ "name": "V", "computer": "Timestamp Value", "data_source": "lfp" }] }
        ]});
        let mut pipeline = TablePipeline::new(&registry, &catalog, &mut tables);
        pipeline.load_from_json(&config).unwrap();
        assert!(pipeline.execute(None).success);

        assert_eq!(tables.built_table("by_index").unwrap().values::<f64>("V").unwrap(), &[2.0, 3.0, 12.0]);
        let by_frame = tables.built_table("by_frame").unwrap();
        assert_eq!(by_frame.row_count(), 51);
        assert_eq!(by_frame.values::<f64>("V").unwrap()[3], 6.0);
    }

    #[test]
    fn test_load_errors() {
        let registry = build_registry();
        let catalog = catalog();
        let mut tables = TableRegistry::new();
        let mut pipeline = TablePipeline::new(&registry, &catalog, &mut tables);

        assert_eq!(pipeline.execute(None).error_message.as_deref(), Some("No configuration loaded"));
        assert!(matches!(pipeline.load_from_json_str("{ not json"), Err(PipelineError::Json(_))));
        match pipeline.load_from_json(&json!({ "tables": [{ "table_id": "t" }] })) {
            Err(PipelineError::Validation(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(pipeline.load_from_json_file("/nonexistent/pipeline.json"), Err(PipelineError::Io { .. })));
        assert_eq!(pipeline.state(), PipelineState::Empty);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json!({ "tables": [position_table()] })).unwrap();

        let registry = build_registry();
        let catalog = catalog();
        let mut tables = TableRegistry::new();
        let mut pipeline = TablePipeline::new(&registry, &catalog, &mut tables);
        pipeline.load_from_json_file(file.path()).unwrap();
        assert_eq!(pipeline.table_configs()[0].table_id, "position");
        assert!(pipeline.execute(None).success);
    }
}
