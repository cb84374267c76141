// Action catalog data models
// Values produced by the document parser and consumed by the UI layer and the request builder

use crate::spec::SecurityRequirement;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Label of the bucket holding operations without a tag
pub const UNCATEGORIZED: &str = "uncategorized";

/// Where a parameter value ends up in the outgoing request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

impl ParameterLocation {
    pub fn from_openapi(value: &str) -> Option<Self> {
        match value {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
            ParameterLocation::Cookie => write!(f, "cookie"),
            ParameterLocation::Body => write!(f, "body"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParameterType {
    /// Map a JSON-schema `type` keyword; unknown types are treated as strings
    pub fn from_schema_type(value: &str) -> Self {
        match value {
            "number" => ParameterType::Number,
            "integer" => ParameterType::Integer,
            "boolean" => ParameterType::Boolean,
            "array" => ParameterType::Array,
            "object" => ParameterType::Object,
            _ => ParameterType::String,
        }
    }
}

/// Parameter of an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionParameter {
    /// Wire name (header name, query key, body field)
    pub name: String,
    /// Key of the value in the caller-supplied parameter map
    pub key: String,
    pub location: ParameterLocation,
    pub required: bool,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Values from the schema `enum`, if any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Value>,
}

impl ActionParameter {
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            name,
            location,
            required: false,
            param_type: ParameterType::String,
            description: None,
            default: None,
            options: Vec::new(),
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn param_type(mut self, param_type: ParameterType) -> Self {
        self.param_type = param_type;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = (!description.is_empty()).then_some(description);
        self
    }

    pub fn default_value(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// How body parameters are assembled into the request payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyShape {
    /// Object schema flattened into one parameter per property
    Fields,
    /// Non-object schema; the single `body` parameter is the payload
    Whole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBodySpec {
    pub content_type: String,
    pub required: bool,
    pub shape: BodyShape,
}

/// An invocable operation derived from the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: String,
    pub label: String,
    pub description: String,
    pub category: String,
    /// Upper-case HTTP method
    pub method: String,
    /// Path template, may contain `{param}` placeholders
    pub path: String,
    pub parameters: Vec<ActionParameter>,
    /// Operation-level requirements; `None` inherits the document default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBodySpec>,
    #[serde(default)]
    pub deprecated: bool,
}

impl Action {
    pub fn new(id: impl Into<String>, method: impl Into<String>, path: impl Into<String>) -> Self {
        let method = method.into().to_uppercase();
        let path = path.into();
        let default_text = format!("{} {}", method, path);
        Self {
            id: id.into(),
            label: default_text.clone(),
            description: default_text,
            category: UNCATEGORIZED.to_string(),
            method,
            path,
            parameters: Vec::new(),
            security: None,
            request_body: None,
            deprecated: false,
        }
    }

    pub fn add_parameter(&mut self, parameter: ActionParameter) {
        self.parameters.push(parameter);
    }

    /// Find a parameter by its value key
    pub fn parameter(&self, key: &str) -> Option<&ActionParameter> {
        self.parameters.iter().find(|p| p.key == key)
    }

    pub fn parameters_in(
        &self,
        location: ParameterLocation,
    ) -> impl Iterator<Item = &ActionParameter> {
        self.parameters.iter().filter(move |p| p.location == location)
    }

    /// Names of the `{placeholders}` in the path template, in order
    pub fn path_placeholders(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.path.as_str();
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) => {
                    names.push(&after[..end]);
                    rest = &after[end + 1..];
                }
                None => break,
            }
        }
        names
    }
}

/// Resource group of actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub label: String,
    /// Ids of the actions in this category, in document order
    pub action_ids: Vec<String>,
}

/// Grouped and flattened view of every action in a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionCatalog {
    pub categories: Vec<Category>,
    pub actions: Vec<Action>,
}

impl ActionCatalog {
    pub fn action(&self, id: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn category(&self, label: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.label == label)
    }

    pub fn actions_in<'a>(&'a self, category: &'a Category) -> impl Iterator<Item = &'a Action> {
        category
            .action_ids
            .iter()
            .filter_map(move |id| self.action(id))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Shape handed to the query configuration panel
    pub fn to_query_config(
        &self,
        label: impl Into<String>,
        category_label: impl Into<String>,
    ) -> QueryConfig {
        QueryConfig {
            config_type: "query".to_string(),
            label: label.into(),
            categories: CategoryGroup {
                label: category_label.into(),
                items: self.categories.clone(),
            },
            actions: self.actions.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub label: String,
    pub items: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(rename = "type")]
    pub config_type: String,
    pub label: String,
    pub categories: CategoryGroup,
    pub actions: Vec<Action>,
}
