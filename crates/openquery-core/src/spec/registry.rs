//! Versioned document registry for a single vendor

use super::document::Document;
use crate::error::{EngineError, EngineResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Select option rendered by the host for the spec version field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

/// Immutable mapping from version key to document
#[derive(Debug, Clone)]
pub struct SpecRegistry {
    specs: IndexMap<String, Arc<Document>>,
    default_version: String,
}

impl SpecRegistry {
    /// Create a registry; the first entry becomes the default version
    pub fn new<K, I>(specs: I) -> EngineResult<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Document)>,
    {
        let mut map = IndexMap::new();
        for (key, document) in specs {
            let key = key.into();
            if key.trim().is_empty() {
                return Err(EngineError::config("spec version key cannot be empty"));
            }
            if map.insert(key.clone(), Arc::new(document)).is_some() {
                return Err(EngineError::config(format!(
                    "spec version registered twice: {}",
                    key
                )));
            }
        }

        let default_version = map
            .keys()
            .next()
            .cloned()
            .ok_or_else(|| EngineError::config("spec registry needs at least one document"))?;

        Ok(Self {
            specs: map,
            default_version,
        })
    }

    /// Registry holding exactly one version
    pub fn single(version: impl Into<String>, document: Document) -> EngineResult<Self> {
        Self::new([(version.into(), document)])
    }

    /// Designate the fallback version used when callers do not pick one
    pub fn with_default(mut self, version: &str) -> EngineResult<Self> {
        if !self.specs.contains_key(version) {
            return Err(EngineError::config(format!(
                "default spec version is not registered: {}",
                version
            )));
        }
        self.default_version = version.to_string();
        Ok(self)
    }

    pub fn default_version(&self) -> &str {
        &self.default_version
    }

    /// Canonical version key for a requested (possibly absent) key
    pub fn resolve_version<'a>(&'a self, requested: Option<&str>) -> EngineResult<&'a str> {
        match requested.map(str::trim).filter(|k| !k.is_empty()) {
            None => Ok(&self.default_version),
            Some(key) => self
                .specs
                .get_key_value(key)
                .map(|(k, _)| k.as_str())
                .ok_or_else(|| EngineError::config(format!("unknown spec version: {}", key))),
        }
    }

    /// Resolve a version key to its document; always the same `Arc` per key
    pub fn resolve(&self, requested: Option<&str>) -> EngineResult<Arc<Document>> {
        let key = self.resolve_version(requested)?;
        self.specs
            .get(key)
            .cloned()
            .ok_or_else(|| EngineError::config(format!("unknown spec version: {}", key)))
    }

    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn options(&self) -> Vec<SelectOption> {
        self.specs
            .keys()
            .map(|k| SelectOption {
                label: k.clone(),
                value: k.clone(),
            })
            .collect()
    }
}
