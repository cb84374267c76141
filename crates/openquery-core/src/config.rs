//! Per-instance data source configuration

use crate::error::{EngineError, EngineResult};
use crate::http::url_builder::UrlBuilder;
use crate::server_url::ServerUrlNormalizer;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Caller-supplied parameter values keyed by `ActionParameter::key`
pub type ParameterValues = Map<String, Value>;

/// Credentials keyed `<SchemeName>.<field>`, e.g. `ApiKeyAuth.value`
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DynamicParamsConfig(IndexMap<String, String>);

impl DynamicParamsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Non-empty credential field for a scheme; empty strings count as missing
    pub fn credential(&self, scheme: &str, field: &str) -> Option<&str> {
        self.get(&format!("{}.{}", scheme, field))
            .filter(|v| !v.is_empty())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DynamicParamsConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// Credential values never reach logs or debug output
impl fmt::Debug for DynamicParamsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.keys().map(|k| (k, "***")))
            .finish()
    }
}

/// Everything the request builder needs to know about one configured instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceConfig {
    /// Already normalized server URL
    pub server_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<String>,
    #[serde(default)]
    pub dynamic_params: DynamicParamsConfig,
    /// Normalizer applied to `server_url` before joining paths; the document's own suffix when unset
    #[serde(skip)]
    pub normalizer: Option<ServerUrlNormalizer>,
}

impl DataSourceConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Default::default()
        }
    }

    pub fn with_spec_version(mut self, version: impl Into<String>) -> Self {
        self.spec_version = Some(version.into());
        self
    }

    pub fn with_credential(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dynamic_params.insert(key, value);
        self
    }

    pub fn with_dynamic_params(mut self, params: DynamicParamsConfig) -> Self {
        self.dynamic_params = params;
        self
    }

    pub fn with_normalizer(mut self, normalizer: ServerUrlNormalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Check the server URL is present and an absolute http(s) URL
    pub fn validate(&self) -> EngineResult<()> {
        if self.server_url.trim().is_empty() {
            return Err(EngineError::config("server URL is required"));
        }
        UrlBuilder::validate(&self.server_url)
    }
}
