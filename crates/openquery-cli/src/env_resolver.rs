//! `${VAR}` and `${VAR:default}` interpolation for data source config files

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::env;
use thiserror::Error;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}:]+)(?::([^}]*))?\}").expect("placeholder pattern"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvResolverError {
    #[error("Environment variable '{0}' not found and no default provided")]
    VarNotFound(String),
    #[error("Environment variable '{0}' is not in whitelist. Allowed prefixes: {1:?}")]
    VarNotWhitelisted(String, Vec<String>),
}

/// Environment variable resolver with a prefix whitelist
#[derive(Debug, Clone)]
pub struct EnvResolver {
    /// Empty means no restrictions
    allowed_prefixes: Vec<String>,
}

impl Default for EnvResolver {
    fn default() -> Self {
        Self {
            allowed_prefixes: vec![
                "OPENQUERY_".to_string(),
                "N8N_".to_string(),
                "APP_".to_string(),
            ],
        }
    }
}

impl EnvResolver {
    pub fn new(allowed_prefixes: Vec<String>) -> Self {
        Self { allowed_prefixes }
    }

    /// Resolver that accepts any variable name
    pub fn unrestricted() -> Self {
        Self {
            allowed_prefixes: vec![],
        }
    }

    /// Resolve placeholders in every string of a JSON value. Resolved
    /// values stay strings; they are not re-scanned for placeholders.
    pub fn resolve(&self, value: &JsonValue) -> Result<JsonValue, EnvResolverError> {
        match value {
            JsonValue::String(s) => self.resolve_string(s).map(JsonValue::String),
            JsonValue::Object(obj) => {
                let mut resolved = serde_json::Map::new();
                for (key, val) in obj {
                    resolved.insert(key.clone(), self.resolve(val)?);
                }
                Ok(JsonValue::Object(resolved))
            }
            JsonValue::Array(arr) => arr
                .iter()
                .map(|item| self.resolve(item))
                .collect::<Result<Vec<_>, _>>()
                .map(JsonValue::Array),
            other => Ok(other.clone()),
        }
    }

    fn resolve_string(&self, input: &str) -> Result<String, EnvResolverError> {
        if !input.contains("${") {
            return Ok(input.to_string());
        }

        let mut result = String::with_capacity(input.len());
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(input) {
            let (Some(full), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let var_name = name.as_str().trim();
            self.validate_var_name(var_name)?;

            let value = match env::var(var_name) {
                Ok(value) => value,
                Err(_) => caps
                    .get(2)
                    .map(|m| m.as_str().to_string())
                    .ok_or_else(|| EnvResolverError::VarNotFound(var_name.to_string()))?,
            };

            result.push_str(&input[last..full.start()]);
            result.push_str(&value);
            last = full.end();
        }

        result.push_str(&input[last..]);
        Ok(result)
    }

    fn validate_var_name(&self, var_name: &str) -> Result<(), EnvResolverError> {
        if self.allowed_prefixes.is_empty()
            || self
                .allowed_prefixes
                .iter()
                .any(|prefix| var_name.starts_with(prefix.as_str()))
        {
            Ok(())
        } else {
            Err(EnvResolverError::VarNotWhitelisted(
                var_name.to_string(),
                self.allowed_prefixes.clone(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_and_default() {
        env::set_var("OPENQUERY_TEST_HOST", "n8n.internal");
        let resolver = EnvResolver::default();

        let resolved = resolver
            .resolve(&json!({
                "serverURL": "https://${OPENQUERY_TEST_HOST}:${OPENQUERY_TEST_PORT:5678}",
                "nested": ["${OPENQUERY_TEST_HOST}", 3, true]
            }))
            .unwrap();

        assert_eq!(resolved["serverURL"], "https://n8n.internal:5678");
        assert_eq!(resolved["nested"], json!(["n8n.internal", 3, true]));
        env::remove_var("OPENQUERY_TEST_HOST");
    }

    #[test]
    fn test_numeric_values_stay_strings() {
        env::set_var("OPENQUERY_TEST_KEY", "12345");
        let resolved = EnvResolver::default()
            .resolve(&json!("${OPENQUERY_TEST_KEY}"))
            .unwrap();
        assert_eq!(resolved, json!("12345"));
        env::remove_var("OPENQUERY_TEST_KEY");
    }

    #[test]
    fn test_missing_variable() {
        let err = EnvResolver::default()
            .resolve(&json!("${OPENQUERY_TEST_UNSET_VAR}"))
            .unwrap_err();
        assert_eq!(
            err,
            EnvResolverError::VarNotFound("OPENQUERY_TEST_UNSET_VAR".to_string())
        );
    }

    #[test]
    fn test_whitelist() {
        let err = EnvResolver::default()
            .resolve(&json!("${HOME}"))
            .unwrap_err();
        assert!(matches!(err, EnvResolverError::VarNotWhitelisted(name, _) if name == "HOME"));

        assert!(EnvResolver::unrestricted().resolve(&json!("${PATH}")).is_ok());
        assert!(EnvResolver::new(vec!["MY_".into()])
            .resolve(&json!("${MY_UNSET:x}"))
            .is_ok());
    }
}
