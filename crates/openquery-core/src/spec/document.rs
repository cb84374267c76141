//! OpenAPI document model
//!
//! Only the subset needed to build requests is typed: servers, paths,
//! security schemes and requirements. Operations stay as raw JSON until the
//! parser visits them so that errors can name the offending path and method.

use crate::error::{EngineError, EngineResult};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Scheme name -> required scopes
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// HTTP methods in the order operations are visited inside a path item
pub const METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// YAML turns `version: 1.0` into a number; accept any scalar as text
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string(deserializer).map(|s| (!s.is_empty()).then_some(s))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Security scheme as declared by the document author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: String,
    /// Header, query or cookie name for `apiKey` schemes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// `basic` / `bearer` for `http` schemes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default)]
    pub security_schemes: IndexMap<String, SecurityScheme>,
    #[serde(default)]
    pub schemas: IndexMap<String, Value>,
    #[serde(default)]
    pub parameters: IndexMap<String, Value>,
    #[serde(default)]
    pub request_bodies: IndexMap<String, Value>,
}

/// Operation object, deserialized lazily by the parser
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    /// `None` inherits the document-level requirements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(default)]
    pub deprecated: bool,
    /// Swagger 2 request media types; empty inherits the document-level list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentHeader {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    openapi: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    swagger: Option<String>,
    #[serde(default)]
    info: Info,
    #[serde(default)]
    servers: Vec<Server>,
    #[serde(default)]
    base_path: Option<String>,
    #[serde(default)]
    consumes: Vec<String>,
    #[serde(default)]
    paths: Option<IndexMap<String, Value>>,
    #[serde(default)]
    components: Components,
    #[serde(default)]
    security_definitions: IndexMap<String, SecurityScheme>,
    #[serde(default)]
    security: Vec<SecurityRequirement>,
    #[serde(default)]
    tags: Vec<Tag>,
}

/// A loaded API document. Immutable once constructed; share it through `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub openapi: Option<String>,
    pub info: Info,
    pub servers: Vec<Server>,
    /// Raw path items in document order; `None` when the document has no `paths`
    pub paths: Option<IndexMap<String, Value>>,
    pub components: Components,
    /// Swagger 2 equivalent of `components.securitySchemes`
    pub security_definitions: IndexMap<String, SecurityScheme>,
    pub security: Vec<SecurityRequirement>,
    pub tags: Vec<Tag>,
    /// Swagger 2 default request media types
    pub consumes: Vec<String>,
    base_path: Option<String>,
    raw: Value,
}

impl Document {
    /// Build a document from an already decoded JSON value
    pub fn from_value(raw: Value) -> EngineResult<Self> {
        if !raw.is_object() {
            return Err(EngineError::parse("document root must be an object"));
        }
        let header: DocumentHeader = serde_json::from_value(raw.clone())
            .map_err(|e| EngineError::parse(format!("invalid document structure: {}", e)))?;

        Ok(Self {
            openapi: header.openapi.or(header.swagger),
            info: header.info,
            servers: header.servers,
            paths: header.paths,
            components: header.components,
            security_definitions: header.security_definitions,
            security: header.security,
            tags: header.tags,
            consumes: header.consumes,
            base_path: header.base_path,
            raw,
        })
    }

    pub fn from_json(text: &str) -> EngineResult<Self> {
        let raw: Value = serde_json::from_str(text)?;
        Self::from_value(raw)
    }

    pub fn from_yaml(text: &str) -> EngineResult<Self> {
        let raw: Value = serde_yaml::from_str(text)?;
        Self::from_value(raw)
    }

    /// Load JSON or YAML text, picking the decoder from the first significant character
    pub fn from_text(text: &str) -> EngineResult<Self> {
        match text.trim_start().chars().next() {
            Some('{') => Self::from_json(text),
            Some(_) => Self::from_yaml(text),
            None => Err(EngineError::parse("document is empty")),
        }
    }

    /// The raw document value, e.g. for re-serialization
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Look up a security scheme in `components.securitySchemes`, then `securityDefinitions`
    pub fn security_scheme(&self, name: &str) -> Option<&SecurityScheme> {
        self.components
            .security_schemes
            .get(name)
            .or_else(|| self.security_definitions.get(name))
    }

    /// Resolve a local `$ref` such as `#/components/schemas/User`
    pub fn resolve_ref(&self, reference: &str) -> Option<&Value> {
        let pointer = reference.strip_prefix('#')?;
        if pointer.is_empty() {
            return Some(&self.raw);
        }
        self.raw.pointer(pointer)
    }

    /// Version suffix taken from the path of the first declared server
    ///
    /// `https://x.example.com/api/v1` and `/api/v1` both yield `api/v1`.
    pub fn version_suffix(&self) -> String {
        let declared = self
            .servers
            .first()
            .map(|s| s.url.as_str())
            .or(self.base_path.as_deref())
            .unwrap_or("");

        // Server URLs may carry `{variables}` in the host, so no strict URL parsing here
        let path = match declared.find("://") {
            Some(idx) => {
                let rest = &declared[idx + 3..];
                rest.find('/').map(|i| &rest[i..]).unwrap_or("")
            }
            None => declared,
        };
        path.trim_matches('/').to_string()
    }

    pub fn operation_count(&self) -> usize {
        self.paths
            .as_ref()
            .map(|paths| {
                paths
                    .values()
                    .filter_map(|item| item.as_object())
                    .map(|item| METHODS.iter().filter(|m| item.contains_key(**m)).count())
                    .sum()
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "openapi": "3.0.0",
            "info": {"title": "Sample", "version": "1.0.0"},
            "servers": [{"url": "/api/v1"}],
            "paths": {
                "/users": {"get": {"summary": "List users"}, "post": {}},
                "/users/{id}": {"get": {}}
            },
            "components": {
                "securitySchemes": {
                    "ApiKeyAuth": {"type": "apiKey", "in": "header", "name": "X-API-Key"}
                },
                "schemas": {"User": {"type": "object"}}
            },
            "security": [{"ApiKeyAuth": []}]
        })
    }

    #[test]
    fn test_from_value() {
        let doc = Document::from_value(sample()).unwrap();
        assert_eq!(doc.info.title, "Sample");
        assert_eq!(doc.operation_count(), 3);
        assert_eq!(doc.security.len(), 1);
        let scheme = doc.security_scheme("ApiKeyAuth").unwrap();
        assert_eq!(scheme.scheme_type, "apiKey");
        assert_eq!(scheme.name.as_deref(), Some("X-API-Key"));
    }

    #[test]
    fn test_paths_keep_document_order() {
        let doc = Document::from_value(sample()).unwrap();
        let keys: Vec<&String> = doc.paths.as_ref().unwrap().keys().collect();
        assert_eq!(keys, vec!["/users", "/users/{id}"]);
    }

    #[test]
    fn test_resolve_ref() {
        let doc = Document::from_value(sample()).unwrap();
        let schema = doc.resolve_ref("#/components/schemas/User").unwrap();
        assert_eq!(schema["type"], "object");
        assert!(doc.resolve_ref("#/components/schemas/Missing").is_none());
        assert!(doc.resolve_ref("other.json#/x").is_none());
    }

    #[test]
    fn test_version_suffix() {
        let doc = Document::from_value(sample()).unwrap();
        assert_eq!(doc.version_suffix(), "api/v1");

        let absolute = Document::from_value(json!({
            "servers": [{"url": "https://api.example.com/v2/"}],
            "paths": {}
        }))
        .unwrap();
        assert_eq!(absolute.version_suffix(), "v2");

        let bare = Document::from_value(json!({"paths": {}})).unwrap();
        assert_eq!(bare.version_suffix(), "");
    }

    #[test]
    fn test_from_text_yaml() {
        let yaml = "openapi: 3.0.0\ninfo:\n  title: Yaml\n  version: '1'\npaths:\n  /ping:\n    get:\n      summary: Ping\n";
        let doc = Document::from_text(yaml).unwrap();
        assert_eq!(doc.info.title, "Yaml");
        assert_eq!(doc.operation_count(), 1);
    }

    #[test]
    fn test_missing_paths_is_not_a_load_error() {
        let doc = Document::from_value(json!({"openapi": "3.0.0"})).unwrap();
        assert!(doc.paths.is_none());
    }

    #[test]
    fn test_numeric_versions_in_yaml() {
        let doc = Document::from_yaml("openapi: 3.1\ninfo:\n  title: T\n  version: 2.0\npaths: {}\n")
            .unwrap();
        assert_eq!(doc.openapi.as_deref(), Some("3.1"));
        assert_eq!(doc.info.version, "2.0");
    }

    #[test]
    fn test_invalid_root() {
        assert!(Document::from_value(json!([1, 2])).is_err());
        assert!(Document::from_text("   ").is_err());
    }

    #[test]
    fn test_swagger_security_definitions() {
        let doc = Document::from_value(json!({
            "swagger": "2.0",
            "basePath": "/api/v1",
            "paths": {},
            "securityDefinitions": {"basic": {"type": "basic"}}
        }))
        .unwrap();
        assert_eq!(doc.openapi.as_deref(), Some("2.0"));
        assert!(doc.security_scheme("basic").is_some());
        assert_eq!(doc.version_suffix(), "api/v1");
    }
}
