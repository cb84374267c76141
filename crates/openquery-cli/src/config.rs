//! Data source config file loading (YAML or JSON)

use crate::env_resolver::EnvResolver;
use crate::error::{CliError, CliResult};
use openquery_plugins::ConfigValues;
use serde_json::Value as JsonValue;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    /// Detect file format from extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> CliResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some(ext) => Err(CliError::Config(format!(
                "unsupported config format: {}",
                ext
            ))),
            None => Err(CliError::Config(format!(
                "cannot detect config format of {} (no extension)",
                path.display()
            ))),
        }
    }
}

/// Reads data source values and interpolates environment variables
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    resolver: EnvResolver,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(mut self, resolver: EnvResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub async fn load_from_file<P: AsRef<Path>>(&self, path: P) -> CliResult<ConfigValues> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CliError::FileNotFound(path.display().to_string()));
        }

        let format = FileFormat::from_path(path)?;
        let content = tokio::fs::read_to_string(path).await?;
        debug!(path = %path.display(), ?format, "loading data source config");
        self.parse_content(&content, format)
    }

    pub fn parse_content(&self, content: &str, format: FileFormat) -> CliResult<ConfigValues> {
        let raw: JsonValue = match format {
            FileFormat::Json => serde_json::from_str(content)?,
            FileFormat::Yaml => serde_yaml::from_str(content)?,
        };

        match self.resolver.resolve(&raw)? {
            JsonValue::Object(values) => Ok(values),
            JsonValue::Null => Ok(ConfigValues::new()),
            _ => Err(CliError::Config(
                "data source config must be a mapping of field keys to values".to_string(),
            )),
        }
    }
}
