//! registry.rs
//!
//! Built tables keyed by id, plus the descriptive info the pipeline records
//! for each. Mutated only from the thread driving the pipeline.
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::BuiltTable;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub column_names: Vec<String>,
    pub row_count: usize,
}

#[derive(Debug, Default)]
pub struct TableRegistry {
    infos: BTreeMap<String, TableInfo>,
    built: BTreeMap<String, Arc<BuiltTable>>,
}

impl TableRegistry {
    pub fn new() -> Self { Self::default() }

    /// Registers an empty table entry. Fails on an empty or taken id.
    pub fn create_table(&mut self, id: &str, name: &str, description: &str) -> bool {
        if id.is_empty() || self.infos.contains_key(id) {
            log::warn!("Cannot create table '{}': id is empty or already in use", id);
            return false;
        }
        let info = TableInfo { id: id.to_string(), name: name.to_string(), description: description.to_string(), ..Default::default() };
        self.infos.insert(id.to_string(), info);
        true
    }

    pub fn update_table_info(&mut self, id: &str, name: &str, description: &str) -> bool {
        match self.infos.get_mut(id) {
            Some(info) => {
                info.name = name.to_string();
                info.description = description.to_string();
                true
            }
            None => false,
        }
    }

    pub fn set_tags(&mut self, id: &str, tags: Vec<String>) -> bool {
        self.infos.get_mut(id).map(|info| info.tags = tags).is_some()
    }

    pub fn has_table(&self, id: &str) -> bool { self.infos.contains_key(id) }

    pub fn remove_table(&mut self, id: &str) -> bool {
        self.built.remove(id);
        self.infos.remove(id).is_some()
    }

    pub fn table_ids(&self) -> Vec<String> { self.infos.keys().cloned().collect() }

    pub fn table_info(&self, id: &str) -> Option<&TableInfo> { self.infos.get(id) }

    /// Stores a finished table, creating its entry if needed. Replaces any
    /// table previously stored under `id`.
    pub fn store_built_table(&mut self, id: &str, table: BuiltTable) -> bool {
        if id.is_empty() {
            return false;
        }
        let info = self.infos.entry(id.to_string()).or_insert_with(|| TableInfo { id: id.to_string(), ..Default::default() });
        info.column_names = table.column_names().iter().map(|s| s.to_string()).collect();
        info.row_count = table.row_count();
        self.built.insert(id.to_string(), Arc::new(table));
        true
    }

    pub fn built_table(&self, id: &str) -> Option<Arc<BuiltTable>> { self.built.get(id).cloned() }

    /// `base` if it is free, else the first free `base_N` for N = 1, 2, ...
    pub fn generate_unique_table_id(&self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut counter = 1;
        while self.infos.contains_key(&candidate) {
            candidate = format!("{}_{}", base, counter);
            counter += 1;
        }
        candidate
    }
}
