//! Generic OpenAPI data source: the document is pasted into the data source form

use crate::config_schema::{string_value, ConfigField, ConfigValues, DataSourceConfigSchema};
use crate::plugin::{ActionData, DataSourcePlugin, PluginMetadata};
use crate::registry::PluginRegistry;
use crate::spec_plugin::{find_action, DEFAULT_CATEGORY_LABEL, DEFAULT_QUERY_LABEL};
use async_trait::async_trait;
use openquery_core::{
    ActionCatalog, ActionResult, DataSourceConfig, Document, DocumentParser, DynamicParamsConfig,
    EngineError, EngineResult, Executor, PreparedRequest, QueryConfig, RunRequest,
    TransportSettings,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub const PLUGIN_ID: &str = "openapi";

pub struct OpenApiPlugin {
    metadata: PluginMetadata,
    schema: DataSourceConfigSchema,
    executor: Executor,
}

impl OpenApiPlugin {
    pub fn new() -> EngineResult<Self> {
        Ok(Self {
            metadata: PluginMetadata::new(PLUGIN_ID, "OpenAPI", "openapi.svg", "Api"),
            schema: DataSourceConfigSchema::new(vec![
                ConfigField::text_area("specContent", "Spec")
                    .required()
                    .tooltip("OpenAPI document in JSON or YAML."),
                ConfigField::text_input("serverURL", "Server URL")
                    .required()
                    .placeholder("https://api.example.com"),
                ConfigField::text_area("credentials", "Credentials")
                    .placeholder("{\"ApiKeyAuth.value\": \"...\"}")
                    .tooltip("Object mapping <Scheme>.<field> to credential values."),
            ]),
            executor: Executor::with_settings(&TransportSettings::default())?,
        })
    }

    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    fn document(values: &ConfigValues) -> EngineResult<Document> {
        let text = string_value(values, "specContent")
            .ok_or_else(|| EngineError::config("missing required field specContent"))?;
        Document::from_text(&text)
    }

    fn compile(values: &ConfigValues) -> EngineResult<(Document, ActionCatalog)> {
        let document = Self::document(values)?;
        let catalog = DocumentParser::with_defaults().parse(&document)?;
        Ok((document, catalog))
    }

    /// Credentials given either as an object or as JSON text
    fn credentials(values: &ConfigValues) -> EngineResult<DynamicParamsConfig> {
        let object = match values.get("credentials") {
            None | Some(Value::Null) => return Ok(DynamicParamsConfig::new()),
            Some(Value::String(text)) if text.trim().is_empty() => {
                return Ok(DynamicParamsConfig::new())
            }
            Some(Value::String(text)) => serde_json::from_str::<Value>(text).map_err(|e| {
                EngineError::config(format!("credentials must be a JSON object: {}", e))
            })?,
            Some(other) => other.clone(),
        };

        let map = object
            .as_object()
            .ok_or_else(|| EngineError::config("credentials must be a JSON object"))?;

        Ok(map
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect())
    }

    fn data_source(&self, values: &ConfigValues) -> EngineResult<DataSourceConfig> {
        self.schema.validate(values)?;
        let server_url = string_value(values, "serverURL")
            .ok_or_else(|| EngineError::config("missing required field serverURL"))?;
        let config =
            DataSourceConfig::new(server_url).with_dynamic_params(Self::credentials(values)?);
        config.validate()?;
        Ok(config)
    }
}

#[async_trait]
impl DataSourcePlugin for OpenApiPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    fn data_source_config(&self) -> &DataSourceConfigSchema {
        &self.schema
    }

    fn query_config(&self, values: &ConfigValues) -> EngineResult<QueryConfig> {
        let (_, catalog) = Self::compile(values)?;
        Ok(catalog.to_query_config(DEFAULT_QUERY_LABEL, DEFAULT_CATEGORY_LABEL))
    }

    fn prepare(&self, action: &ActionData, values: &ConfigValues) -> EngineResult<PreparedRequest> {
        let config = self.data_source(values)?;
        let (document, catalog) = Self::compile(values)?;
        let target = find_action(&catalog, &action.action_name)?;
        self.executor.prepare(&RunRequest::new(
            &document,
            target,
            &config,
            &action.parameters,
        ))
    }

    async fn run(&self, action: &ActionData, values: &ConfigValues) -> EngineResult<ActionResult> {
        let config = self.data_source(values)?;
        let (document, catalog) = Self::compile(values)?;
        let target = find_action(&catalog, &action.action_name)?;

        debug!(plugin = PLUGIN_ID, action = %target.id, "running action");

        self.executor
            .run(&RunRequest::new(&document, target, &config, &action.parameters))
            .await
    }
}

pub fn register(registry: &mut PluginRegistry, executor: &Executor) -> EngineResult<()> {
    registry.register(Arc::new(OpenApiPlugin::new()?.with_executor(executor.clone())))
}
