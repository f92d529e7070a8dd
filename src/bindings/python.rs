// FFI Facade: the `_core` Python module.
// Python owns one `_TableEngine`, fills its catalog with arrays, and runs
// JSON pipelines against it.

use crate::pipeline::TablePipeline;
use crate::registry::{build_registry, ComputerRegistry};
use crate::sources::{AnalogSeries, DataCatalog, EventSeries, IntervalSeries};
use crate::table::TableRegistry;
use crate::time::{TimeFrame, TimeFrameIndex, TimeFrameInterval};
use pyo3::exceptions::{PyKeyError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::sync::Arc;

#[pyclass(name = "_TableEngine")]
#[derive(Debug)]
pub struct PyTableEngine {
    registry: ComputerRegistry,
    catalog: DataCatalog,
    tables: TableRegistry,
}

impl PyTableEngine {
    fn frame(&self, key: &str) -> PyResult<Arc<TimeFrame>> {
        self.catalog
            .time_frame(key)
            .cloned()
            .ok_or_else(|| PyKeyError::new_err(format!("Time frame '{}' not found", key)))
    }
}

#[pymethods]
impl PyTableEngine {
    #[new]
    pub fn new() -> Self {
        Self { registry: build_registry(), catalog: DataCatalog::new(), tables: TableRegistry::new() }
    }

    pub fn add_time_frame(&mut self, key: String, times: Vec<i64>) -> PyResult<()> {
        let frame = TimeFrame::new(times).map_err(|e| PyValueError::new_err(e.to_string()))?;
        self.catalog.add_time_frame(key, Arc::new(frame));
        Ok(())
    }

    pub fn add_analog(&mut self, key: String, values: Vec<f64>, timeframe: &str) -> PyResult<()> {
        let frame = self.frame(timeframe)?;
        self.catalog.add_analog(key.clone(), Arc::new(AnalogSeries::dense(key, frame, values)));
        Ok(())
    }

    pub fn add_events(&mut self, key: String, indices: Vec<i64>, timeframe: &str) -> PyResult<()> {
        let frame = self.frame(timeframe)?;
        let events = indices.into_iter().map(TimeFrameIndex).collect();
        self.catalog.add_events(key.clone(), Arc::new(EventSeries::new(key, frame, events)));
        Ok(())
    }

    pub fn add_intervals(&mut self, key: String, intervals: Vec<(i64, i64)>, timeframe: &str) -> PyResult<()> {
        let frame = self.frame(timeframe)?;
        let intervals = intervals
            .into_iter()
            .map(|(start, end)| TimeFrameInterval::new(start, end))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        self.catalog.add_intervals(key.clone(), Arc::new(IntervalSeries::new(key, frame, intervals)));
        Ok(())
    }

    /// Loads and executes a pipeline. Returns the run result as JSON.
    pub fn run_json(&mut self, config: &str) -> PyResult<String> {
        let mut pipeline = TablePipeline::new(&self.registry, &self.catalog, &mut self.tables);
        pipeline.load_from_json_str(config).map_err(|e| PyValueError::new_err(e.to_string()))?;
        let result = pipeline.execute(None);
        serde_json::to_string(&result).map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }

    pub fn table_ids(&self) -> Vec<String> { self.tables.table_ids() }

    /// Numeric column values as doubles.
    pub fn column(&self, table_id: &str, column: &str) -> PyResult<Vec<f64>> {
        let table = self
            .tables
            .built_table(table_id)
            .ok_or_else(|| PyKeyError::new_err(format!("Table '{}' not found", table_id)))?;
        let column = table.column(column).map_err(|e| PyKeyError::new_err(e.to_string()))?;
        column
            .values
            .as_f64()
            .ok_or_else(|| PyValueError::new_err(format!("Column '{}' is not numeric", column.name)))
    }

    pub fn computer_names(&self) -> Vec<String> {
        self.registry.computer_names().into_iter().map(str::to_string).collect()
    }

    /// Every computer's metadata, including parameter descriptors, as JSON.
    pub fn computer_info_json(&self) -> PyResult<String> {
        let infos: Vec<_> = self.registry.all_computers().collect();
        serde_json::to_string(&infos).map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTableEngine>()?;
    Ok(())
}
