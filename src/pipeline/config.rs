//! config.rs
//!
//! JSON pipeline configuration: the serde model plus the field-level
//! validation pass that runs before anything is deserialized.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::registry::Params;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub metadata: Value,
    pub tables: Vec<TableConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TableConfig {
    pub table_id: String,
    pub name: String,
    pub description: String,
    pub row_selector: RowSelectorConfig,
    pub columns: Vec<ColumnConfig>,
    pub tags: Vec<String>,
    pub transforms: Vec<TransformConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RowSelectorConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub source: Option<String>,
    pub intervals: Option<Vec<IntervalLiteral>>,
    pub timestamps: Option<Vec<Number>>,
    pub indices: Option<Vec<Number>>,
    pub timeframe: Option<String>,
}

/// Literal row positions. Fractional values truncate toward zero.
pub fn whole_numbers(numbers: &[Number]) -> Vec<i64> {
    numbers.iter().filter_map(|n| n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))).collect()
}

/// `[start, end]` or `{"start": .., "end": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum IntervalLiteral {
    Pair([i64; 2]),
    Object { start: i64, end: i64 },
}

impl IntervalLiteral {
    pub fn bounds(&self) -> (i64, i64) {
        match *self {
            IntervalLiteral::Pair([start, end]) => (start, end),
            IntervalLiteral::Object { start, end } => (start, end),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub name: String,
    pub computer: String,
    pub data_source: DataSourceRef,
    pub parameters: Map<String, Value>,
}

impl ColumnConfig {
    pub fn params(&self) -> Params { to_params(&self.parameters) }
}

/// A plain source key, or raw data run through an adapter.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DataSourceRef {
    Key(String),
    Adapted {
        key: String,
        adapter: String,
        #[serde(default)]
        parameters: Map<String, Value>,
    },
}

impl Default for DataSourceRef {
    fn default() -> Self { DataSourceRef::Key(String::new()) }
}

impl DataSourceRef {
    pub fn key(&self) -> &str {
        match self {
            DataSourceRef::Key(key) | DataSourceRef::Adapted { key, .. } => key,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransformConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub parameters: Map<String, Value>,
    pub output_table_id: Option<String>,
    pub output_name: Option<String>,
    pub output_description: Option<String>,
}

/// JSON strings pass through unchanged; any other value becomes its JSON text.
pub fn to_params(map: &Map<String, Value>) -> Params {
    map.iter()
        .map(|(k, v)| {
            let text = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), text)
        })
        .collect()
}

const SELECTOR_TYPES: [&str; 3] = ["interval", "timestamp", "index"];

/// Collects every field-level problem in a raw configuration document.
pub fn validate(root: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    let Some(tables) = root.get("tables").and_then(Value::as_array) else {
        errors.push("configuration must contain a 'tables' array".to_string());
        return errors;
    };

    for (i, table) in tables.iter().enumerate() {
        let label = match table.get("table_id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => format!("table '{}'", id),
            _ => format!("table {}", i),
        };
        let non_empty = |field: &str| table.get(field).and_then(Value::as_str).is_some_and(|s| !s.is_empty());

        if !non_empty("table_id") {
            errors.push(format!("{}: table_id cannot be empty", label));
        }
        if !non_empty("name") {
            errors.push(format!("{}: name cannot be empty", label));
        }

        match table.get("row_selector").and_then(|s| s.get("type")).and_then(Value::as_str) {
            None => errors.push(format!("{}: row_selector must have 'type' field", label)),
            Some(kind) if !SELECTOR_TYPES.contains(&kind) => {
                errors.push(format!("{}: unknown row_selector type '{}'", label, kind))
            }
            Some(_) => {}
        }

        let columns = table.get("columns").and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
        if columns.is_empty() {
            errors.push(format!("{}: table must have at least one column", label));
        }
        for (j, column) in columns.iter().enumerate() {
            for field in ["name", "computer", "data_source"] {
                if column.get(field).is_none() {
                    errors.push(format!("{}: column {} missing '{}' field", label, j, field));
                }
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn table() -> Value {
        json!({
            "table_id": "t",
            "name": "Trials",
            "row_selector": { "type": "interval", "intervals": [[0, 10], { "start": 20, "end": 30 }] },
            "columns": [
                { "name": "Mean", "computer": "Interval Mean", "data_source": "lfp" },
                { "name": "X", "computer": "Timestamp Value",
                  "data_source": { "key": "pos", "adapter": "Point X Component" },
                  "parameters": { "segments": 4, "mode": "centered" } }
            ]
        })
    }

    #[test]
    fn test_valid_document_parses() {
        let root = json!({ "metadata": { "version": 1 }, "tables": [table()] });
        assert!(validate(&root).is_empty());
        let config: PipelineConfig = serde_json::from_value(root).unwrap();
        let t = &config.tables[0];
        let intervals = t.row_selector.intervals.as_ref().unwrap();
        assert_eq!(intervals[0].bounds(), (0, 10));
        assert_eq!(intervals[1].bounds(), (20, 30));
        assert!(t.row_selector.timestamps.is_none());
        assert_eq!(t.columns[0].data_source, DataSourceRef::Key("lfp".into()));
        assert_eq!(t.columns[1].data_source.key(), "pos");
        let params = t.columns[1].params();
        assert_eq!(params["segments"], "4");
        assert_eq!(params["mode"], "centered");
    }

    #[rstest]
    #[case("table_id", "table 0: table_id cannot be empty")]
    #[case("name", "table 't': name cannot be empty")]
    #[case("row_selector", "table 't': row_selector must have 'type' field")]
    #[case("columns", "table 't': table must have at least one column")]
    fn test_missing_table_fields(#[case] field: &str, #[case] message: &str) {
        let mut t = table();
        t.as_object_mut().unwrap().remove(field);
        let errors = validate(&json!({ "tables": [t] }));
        assert_eq!(errors, vec![message.to_string()]);
    }

    #[test]
    fn test_missing_column_fields_are_all_reported() {
        let mut t = table();
        t["columns"] = json!([{ "name": "a" }]);
        let errors = validate(&json!({ "tables": [t] }));
        assert_eq!(
            errors,
            vec![
                "table 't': column 0 missing 'computer' field".to_string(),
                "table 't': column 0 missing 'data_source' field".to_string(),
            ]
        );
    }

    #[test]
    fn test_fractional_timestamps_truncate() {
        let selector: RowSelectorConfig = serde_json::from_value(json!({ "type": "timestamp", "timestamps": [1, 2.7, 40] })).unwrap();
        assert_eq!(whole_numbers(selector.timestamps.as_deref().unwrap()), vec![1, 2, 40]);
    }

    #[test]
    fn test_tables_array_required() {
        assert_eq!(validate(&json!({ "metadata": {} })).len(), 1);
        let mut t = table();
        t["row_selector"]["type"] = json!("rows");
        assert_eq!(validate(&json!({ "tables": [t] })), vec!["table 't': unknown row_selector type 'rows'".to_string()]);
    }
}
