//! The computer and adapter catalog.
//!
//! A registry is populated once by `build_registry()` and is read-only from
//! then on; consumers share it by reference. Construction by name checks the
//! source capability and parameters, and the typed entry points additionally
//! check the declared output type.
pub mod builtin;
pub mod parameters;

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::computers::{ColumnComputer, ColumnElement, ElementType, ErasedComputer, MultiColumnComputer, OutputType};
use crate::error::ConfigError;
use crate::plan::RowSelectorKind;
use crate::sources::{DataSourceVariant, RawData, RawDataType, SourceKind};

pub use builtin::build_registry;
pub use parameters::{ParameterDescriptor, Params};

/// Parameter key carrying the resolved source's name into factories.
pub const SOURCE_NAME_PARAM: &str = "__source_name__";

pub type ComputerFactory = Box<dyn Fn(&DataSourceVariant, &Params) -> Result<ErasedComputer, ConfigError> + Send + Sync>;
pub type SuffixFactory = Box<dyn Fn(&Params) -> Vec<String> + Send + Sync>;
pub type AdapterFactory = Box<dyn Fn(&RawData, &str, &Params) -> Result<DataSourceVariant, ConfigError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputerInfo {
    pub name: String,
    pub description: String,
    pub output_type: OutputType,
    pub output_type_name: &'static str,
    pub is_vector_type: bool,
    pub element_type: Option<ElementType>,
    pub row_selector: RowSelectorKind,
    pub source_kind: SourceKind,
    pub parameters: Vec<ParameterDescriptor>,
    pub is_multi_output: bool,
}

impl ComputerInfo {
    pub fn new(name: &str, description: &str, output_type: OutputType, row_selector: RowSelectorKind, source_kind: SourceKind) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            output_type,
            output_type_name: output_type.name(),
            is_vector_type: output_type.is_vector(),
            element_type: output_type.element_type(),
            row_selector,
            source_kind,
            parameters: Vec::new(),
            is_multi_output: false,
        }
    }

    pub fn with_parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn multi_output(mut self) -> Self {
        self.is_multi_output = true;
        self
    }

    pub fn has_parameters(&self) -> bool { !self.parameters.is_empty() }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterInfo {
    pub name: String,
    pub description: String,
    pub input_type: RawDataType,
    pub output_kind: SourceKind,
    pub parameters: Vec<ParameterDescriptor>,
}

struct ComputerEntry {
    info: ComputerInfo,
    factory: ComputerFactory,
    suffixes: Option<SuffixFactory>,
}

struct AdapterEntry {
    info: AdapterInfo,
    factory: AdapterFactory,
}

pub struct ComputerRegistry {
    computers: Vec<ComputerEntry>,
    by_name: HashMap<String, usize>,
    by_selector_source: HashMap<(RowSelectorKind, SourceKind), Vec<usize>>,
    adapters: Vec<AdapterEntry>,
    adapters_by_name: HashMap<String, usize>,
    adapters_by_input: HashMap<RawDataType, Vec<usize>>,
}

impl fmt::Debug for ComputerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputerRegistry")
            .field("computers", &self.computer_names())
            .field("adapters", &self.adapter_names())
            .finish()
    }
}

impl ComputerRegistry {
    pub(crate) fn empty() -> Self {
        Self {
            computers: Vec::new(),
            by_name: HashMap::new(),
            by_selector_source: HashMap::new(),
            adapters: Vec::new(),
            adapters_by_name: HashMap::new(),
            adapters_by_input: HashMap::new(),
        }
    }

    // --- Registration (construction phase only) ---

    pub(crate) fn register_computer(&mut self, info: ComputerInfo, factory: ComputerFactory) {
        self.insert_computer(ComputerEntry { info, factory, suffixes: None });
    }

    pub(crate) fn register_multi_computer(&mut self, info: ComputerInfo, suffixes: SuffixFactory, factory: ComputerFactory) {
        self.insert_computer(ComputerEntry { info: info.multi_output(), factory, suffixes: Some(suffixes) });
    }

    fn insert_computer(&mut self, entry: ComputerEntry) {
        if self.by_name.contains_key(&entry.info.name) {
            log::warn!("Computer '{}' is already registered; keeping the first registration", entry.info.name);
            return;
        }
        let pos = self.computers.len();
        self.by_name.insert(entry.info.name.clone(), pos);
        self.by_selector_source
            .entry((entry.info.row_selector, entry.info.source_kind))
            .or_default()
            .push(pos);
        self.computers.push(entry);
    }

    pub(crate) fn register_adapter(&mut self, info: AdapterInfo, factory: AdapterFactory) {
        if self.adapters_by_name.contains_key(&info.name) {
            log::warn!("Adapter '{}' is already registered; keeping the first registration", info.name);
            return;
        }
        let pos = self.adapters.len();
        self.adapters_by_name.insert(info.name.clone(), pos);
        self.adapters_by_input.entry(info.input_type).or_default().push(pos);
        self.adapters.push(AdapterEntry { info, factory });
    }

    // --- Queries ---

    fn entry(&self, name: &str) -> Result<&ComputerEntry, ConfigError> {
        self.by_name
            .get(name)
            .map(|&pos| &self.computers[pos])
            .ok_or_else(|| ConfigError::UnknownComputer(name.to_string()))
    }

    pub fn find_computer_info(&self, name: &str) -> Option<&ComputerInfo> {
        self.by_name.get(name).map(|&pos| &self.computers[pos].info)
    }

    /// Computers that accept rows of `selector` over sources of `source`, in
    /// registration order.
    pub fn computers_for(&self, selector: RowSelectorKind, source: SourceKind) -> Vec<&ComputerInfo> {
        self.by_selector_source
            .get(&(selector, source))
            .map(|positions| positions.iter().map(|&p| &self.computers[p].info).collect())
            .unwrap_or_default()
    }

    pub fn available_computers(&self, selector: RowSelectorKind, source: &DataSourceVariant) -> Vec<&ComputerInfo> {
        self.computers_for(selector, source.kind())
    }

    pub fn computer_names(&self) -> Vec<&str> {
        self.computers.iter().map(|e| e.info.name.as_str()).collect()
    }

    pub fn all_computers(&self) -> impl Iterator<Item = &ComputerInfo> {
        self.computers.iter().map(|e| &e.info)
    }

    /// Distinct declared output types, sorted.
    pub fn available_output_types(&self) -> Vec<OutputType> {
        let mut types: Vec<OutputType> = self.computers.iter().map(|e| e.info.output_type).collect();
        types.sort();
        types.dedup();
        types
    }

    pub fn computers_by_output_type(&self, output_type: OutputType) -> Vec<&ComputerInfo> {
        self.all_computers().filter(|i| i.output_type == output_type).collect()
    }

    pub fn is_vector_computer(&self, name: &str) -> bool {
        self.find_computer_info(name).is_some_and(|i| i.is_vector_type)
    }

    pub fn element_type(&self, name: &str) -> Option<ElementType> {
        self.find_computer_info(name).and_then(|i| i.element_type)
    }

    /// Column suffixes a multi-output computer would produce for `params`.
    /// `None` for unknown or single-output computers.
    pub fn output_suffixes(&self, name: &str, params: &Params) -> Option<Vec<String>> {
        let entry = self.by_name.get(name).map(|&pos| &self.computers[pos])?;
        entry.suffixes.as_ref().map(|f| f(params))
    }

    // --- Construction ---

    /// Builds a type-erased computer after checking the source capability and
    /// validating `params` against the declared descriptors.
    pub fn create_computer(&self, name: &str, source: &DataSourceVariant, params: &Params) -> Result<ErasedComputer, ConfigError> {
        let entry = self.entry(name)?;
        let info = &entry.info;

        // 1. Source capability
        if source.kind() != info.source_kind {
            return Err(ConfigError::SourceKindMismatch {
                computer: name.to_string(),
                expected: info.source_kind,
                actual: source.kind(),
            });
        }

        // 2. Declared parameters
        for descriptor in &info.parameters {
            descriptor
                .validate(params.get(descriptor.name()).map(String::as_str))
                .map_err(|message| ConfigError::InvalidParameter {
                    computer: name.to_string(),
                    parameter: descriptor.name().to_string(),
                    message,
                })?;
        }

        // 3. Factory
        let mut params = params.clone();
        params
            .entry(SOURCE_NAME_PARAM.to_string())
            .or_insert_with(|| source.name().to_string());
        (entry.factory)(source, &params)
    }

    /// As `create_computer`, also requiring the computer to accept `selector` rows.
    pub fn create_computer_for(
        &self,
        name: &str,
        selector: RowSelectorKind,
        source: &DataSourceVariant,
        params: &Params,
    ) -> Result<ErasedComputer, ConfigError> {
        let info = self.entry(name)?.info.clone();
        if info.row_selector != selector {
            return Err(ConfigError::RowSelectorMismatch {
                computer: name.to_string(),
                expected: info.row_selector,
                actual: selector,
            });
        }
        self.create_computer(name, source, params)
    }

    /// Statically typed construction. Returns `None` whenever the computer's
    /// declared output type is not `T`, or construction fails.
    pub fn create_typed_computer<T: ColumnElement>(
        &self,
        name: &str,
        source: &DataSourceVariant,
        params: &Params,
    ) -> Option<Box<dyn ColumnComputer<T>>> {
        let info = self.find_computer_info(name)?;
        if info.is_multi_output || info.output_type != T::OUTPUT_TYPE {
            log::debug!("Computer '{}' produces {}, not {}", name, info.output_type, T::OUTPUT_TYPE);
            return None;
        }
        match self.create_computer(name, source, params) {
            Ok(computer) => computer.into_single::<T>(),
            Err(e) => {
                log::warn!("Failed to create computer '{}': {}", name, e);
                None
            }
        }
    }

    pub fn create_typed_multi_computer<T: ColumnElement>(
        &self,
        name: &str,
        source: &DataSourceVariant,
        params: &Params,
    ) -> Option<Box<dyn MultiColumnComputer<T>>> {
        let info = self.find_computer_info(name)?;
        if !info.is_multi_output || info.output_type != T::OUTPUT_TYPE {
            log::debug!("Computer '{}' is not a multi-output {} computer", name, T::OUTPUT_TYPE);
            return None;
        }
        match self.create_computer(name, source, params) {
            Ok(computer) => computer.into_multi::<T>(),
            Err(e) => {
                log::warn!("Failed to create computer '{}': {}", name, e);
                None
            }
        }
    }

    // --- Adapters ---

    pub fn adapter_names(&self) -> Vec<&str> {
        self.adapters.iter().map(|e| e.info.name.as_str()).collect()
    }

    pub fn find_adapter_info(&self, name: &str) -> Option<&AdapterInfo> {
        self.adapters_by_name.get(name).map(|&pos| &self.adapters[pos].info)
    }

    pub fn available_adapters(&self, input: RawDataType) -> Vec<&AdapterInfo> {
        self.adapters_by_input
            .get(&input)
            .map(|positions| positions.iter().map(|&p| &self.adapters[p].info).collect())
            .unwrap_or_default()
    }

    /// Wraps raw data into a source through the named adapter.
    pub fn create_adapter(&self, name: &str, raw: &RawData, source_name: &str, params: &Params) -> Result<DataSourceVariant, ConfigError> {
        let entry = self
            .adapters_by_name
            .get(name)
            .map(|&pos| &self.adapters[pos])
            .ok_or_else(|| ConfigError::UnknownAdapter(name.to_string()))?;
        if raw.data_type() != entry.info.input_type {
            return Err(ConfigError::AdapterInputMismatch {
                adapter: name.to_string(),
                expected: entry.info.input_type,
                actual: raw.data_type(),
            });
        }
        (entry.factory)(raw, source_name, params)
    }
}
