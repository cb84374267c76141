//! Declarative data source configuration forms

use openquery_core::{EngineError, EngineResult, SelectOption};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Values entered by the user in the data source form, keyed by field key
pub type ConfigValues = Map<String, Value>;

/// Trimmed, non-empty string value of a field; numbers and booleans are stringified
pub fn string_value(values: &ConfigValues, key: &str) -> Option<String> {
    match values.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    TextInput,
    Password,
    Select,
    Number,
    Checkbox,
    TextArea,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigField {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

impl ConfigField {
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            required: false,
            placeholder: None,
            tooltip: None,
            options: Vec::new(),
        }
    }

    pub fn text_input(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldType::TextInput)
    }

    pub fn text_area(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldType::TextArea)
    }

    pub fn password(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldType::Password)
    }

    pub fn select(
        key: impl Into<String>,
        label: impl Into<String>,
        options: Vec<SelectOption>,
    ) -> Self {
        let mut field = Self::new(key, label, FieldType::Select);
        field.options = options;
        field
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    fn check(&self, values: &ConfigValues) -> EngineResult<()> {
        let value = values.get(&self.key).filter(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        });

        let Some(value) = value else {
            if self.required {
                return Err(EngineError::config(format!(
                    "missing required field {}",
                    self.key
                )));
            }
            return Ok(());
        };

        let valid = match self.field_type {
            FieldType::Number => {
                value.is_number() || value.as_str().map_or(false, |s| s.trim().parse::<f64>().is_ok())
            }
            FieldType::Checkbox => value.is_boolean(),
            FieldType::TextArea => true,
            FieldType::Select if !self.options.is_empty() => value
                .as_str()
                .map_or(false, |s| self.options.iter().any(|o| o.value == s.trim())),
            _ => value.is_string(),
        };

        if valid {
            Ok(())
        } else {
            Err(EngineError::config(format!(
                "invalid value for field {}",
                self.key
            )))
        }
    }
}

/// The form a plugin asks the host to render for a data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSourceConfigSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub params: Vec<ConfigField>,
}

impl DataSourceConfigSchema {
    pub fn new(params: Vec<ConfigField>) -> Self {
        Self {
            schema_type: "dataSource".to_string(),
            params,
        }
    }

    pub fn field(&self, key: &str) -> Option<&ConfigField> {
        self.params.iter().find(|f| f.key == key)
    }

    /// Check required fields and value types, in declaration order
    pub fn validate(&self, values: &ConfigValues) -> EngineResult<()> {
        self.params.iter().try_for_each(|field| field.check(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openquery_core::ErrorKind;
    use serde_json::json;

    fn schema() -> DataSourceConfigSchema {
        DataSourceConfigSchema::new(vec![
            ConfigField::text_input("serverURL", "Server URL").required(),
            ConfigField::password("apiKey", "API Key").required(),
            ConfigField::select(
                "specVersion",
                "Spec Version",
                vec![SelectOption {
                    label: "v1.0".into(),
                    value: "v1.0".into(),
                }],
            ),
            ConfigField::new("timeout", "Timeout", FieldType::Number),
        ])
    }

    fn values(value: Value) -> ConfigValues {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_validate_ok() {
        let result = schema().validate(&values(json!({
            "serverURL": "https://n8n.example.com",
            "apiKey": "k",
            "specVersion": "v1.0",
            "timeout": "30"
        })));
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_required_field() {
        let err = schema()
            .validate(&values(json!({"serverURL": "https://x", "apiKey": "  "})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("missing required field apiKey"));
    }

    #[test]
    fn test_invalid_values() {
        let err = schema()
            .validate(&values(json!({"serverURL": "x", "apiKey": "k", "specVersion": "v9.9"})))
            .unwrap_err();
        assert!(err.to_string().contains("specVersion"));

        let err = schema()
            .validate(&values(json!({"serverURL": "x", "apiKey": "k", "timeout": "soon"})))
            .unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(schema()).unwrap();
        assert_eq!(value["type"], "dataSource");
        assert_eq!(value["params"][0]["type"], "textInput");
        assert_eq!(value["params"][1]["type"], "password");
        assert_eq!(value["params"][2]["options"][0]["value"], "v1.0");
        assert!(value["params"][0].get("options").is_none());
    }

    #[test]
    fn test_string_value() {
        let v = values(json!({"a": " x ", "b": "", "c": 3, "d": null}));
        assert_eq!(string_value(&v, "a").as_deref(), Some("x"));
        assert_eq!(string_value(&v, "b"), None);
        assert_eq!(string_value(&v, "c").as_deref(), Some("3"));
        assert_eq!(string_value(&v, "d"), None);
        assert_eq!(string_value(&v, "missing"), None);
    }
}
