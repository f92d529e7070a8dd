//! parameters.rs
//!
//! Declarative parameter descriptors. They drive UI generation and validate
//! the string-keyed parameter map before a factory sees it.
use serde::Serialize;
use std::collections::BTreeMap;

/// String-keyed computer parameters, as they arrive from configuration.
pub type Params = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParameterDescriptor {
    Enum {
        name: String,
        description: String,
        options: Vec<String>,
        default: String,
    },
    Int {
        name: String,
        description: String,
        default: i64,
        min: i64,
        max: i64,
    },
    Text {
        name: String,
        description: String,
        default: String,
    },
}

impl ParameterDescriptor {
    pub fn enumeration(name: &str, description: &str, options: &[&str], default: &str) -> Self {
        ParameterDescriptor::Enum {
            name: name.to_string(),
            description: description.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            default: default.to_string(),
        }
    }

    pub fn integer(name: &str, description: &str, default: i64, min: i64, max: i64) -> Self {
        ParameterDescriptor::Int {
            name: name.to_string(),
            description: description.to_string(),
            default,
            min,
            max,
        }
    }

    pub fn text(name: &str, description: &str, default: &str) -> Self {
        ParameterDescriptor::Text {
            name: name.to_string(),
            description: description.to_string(),
            default: default.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ParameterDescriptor::Enum { name, .. }
            | ParameterDescriptor::Int { name, .. }
            | ParameterDescriptor::Text { name, .. } => name,
        }
    }

    pub fn default_value(&self) -> String {
        match self {
            ParameterDescriptor::Enum { default, .. } | ParameterDescriptor::Text { default, .. } => default.clone(),
            ParameterDescriptor::Int { default, .. } => default.to_string(),
        }
    }

    /// Widget the UI should render for this parameter.
    pub fn ui_hint(&self) -> &'static str {
        match self {
            ParameterDescriptor::Enum { .. } => "enum",
            ParameterDescriptor::Int { .. } => "number",
            ParameterDescriptor::Text { .. } => "text",
        }
    }

    pub fn ui_properties(&self) -> BTreeMap<String, String> {
        let mut props = BTreeMap::new();
        props.insert("default".to_string(), self.default_value());
        match self {
            ParameterDescriptor::Enum { options, .. } => {
                props.insert("options".to_string(), options.join(","));
            }
            ParameterDescriptor::Int { min, max, .. } => {
                props.insert("min".to_string(), min.to_string());
                props.insert("max".to_string(), max.to_string());
            }
            ParameterDescriptor::Text { .. } => {}
        }
        props
    }

    /// Checks a supplied value. A missing value falls back to the default.
    pub fn validate(&self, value: Option<&str>) -> Result<(), String> {
        let Some(value) = value else { return Ok(()) };
        match self {
            ParameterDescriptor::Enum { options, .. } => {
                if options.iter().any(|o| o == value) {
                    Ok(())
                } else {
                    Err(format!("'{}' is not one of [{}]", value, options.join(", ")))
                }
            }
            ParameterDescriptor::Int { min, max, .. } => {
                let v: i64 = value.trim().parse().map_err(|_| format!("'{}' is not an integer", value))?;
                if v < *min || v > *max {
                    return Err(format!("{} is outside [{}, {}]", v, min, max));
                }
                Ok(())
            }
            ParameterDescriptor::Text { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, true)]
    #[case(Some("2"), true)]
    #[case(Some("0"), false)]
    #[case(Some("1001"), false)]
    #[case(Some("two"), false)]
    fn test_int_validation(#[case] value: Option<&str>, #[case] ok: bool) {
        let p = ParameterDescriptor::integer("segments", "", 2, 1, 1000);
        assert_eq!(p.validate(value).is_ok(), ok);
    }

    #[test]
    fn test_enum_validation_and_ui() {
        let p = ParameterDescriptor::enumeration("mode", "Gather mode", &["absolute", "centered"], "absolute");
        assert!(p.validate(Some("centered")).is_ok());
        assert!(p.validate(Some("relative")).is_err());
        assert_eq!(p.ui_hint(), "enum");
        assert_eq!(p.ui_properties()["options"], "absolute,centered");
    }

    #[test]
    fn test_descriptor_serializes_with_kind_tag() {
        let p = ParameterDescriptor::integer("segments", "n", 2, 1, 1000);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["kind"], "int");
        assert_eq!(json["max"], 1000);
    }
}
