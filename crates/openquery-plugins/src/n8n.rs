//! n8n workflow automation data source

use crate::config_schema::{string_value, ConfigField, ConfigValues, DataSourceConfigSchema};
use crate::plugin::PluginMetadata;
use crate::registry::PluginRegistry;
use crate::spec_plugin::SpecPlugin;
use openquery_core::{
    Document, DynamicParamsConfig, EngineResult, Executor, ParseOptions, ServerUrlNormalizer,
    SpecRegistry,
};
use std::sync::Arc;

pub const PLUGIN_ID: &str = "n8n";
pub const DEFAULT_SPEC_VERSION: &str = "v1.0";

const SPEC_V1: &str = include_str!("specs/n8n-v1.json");

/// Server URLs ending in `/api/v1` or `/api/v2` are taken as-is, others get `api/v1`
pub fn server_url_normalizer() -> ServerUrlNormalizer {
    ServerUrlNormalizer::new("api/v1").accept("api/v2")
}

pub fn spec_registry() -> EngineResult<SpecRegistry> {
    SpecRegistry::single(DEFAULT_SPEC_VERSION, Document::from_json(SPEC_V1)?)
}

fn map_credentials(values: &ConfigValues) -> DynamicParamsConfig {
    DynamicParamsConfig::new().with(
        "ApiKeyAuth.value",
        string_value(values, "apiKey").unwrap_or_default(),
    )
}

fn config_schema(registry: &SpecRegistry) -> DataSourceConfigSchema {
    DataSourceConfigSchema::new(vec![
        ConfigField::text_input("serverURL", "Server URL")
            .required()
            .placeholder("https://<your-cloud-instance>")
            .tooltip("Input the server url of your n8n cloud instance or your self-hosting instance."),
        ConfigField::password("apiKey", "X-N8N-API-KEY")
            .required()
            .placeholder("<Your API KEY>")
            .tooltip("You api key, doc: [n8n API authentication](https://docs.n8n.io/api/authentication/)"),
        ConfigField::select("specVersion", "Spec Version", registry.options())
            .placeholder(DEFAULT_SPEC_VERSION)
            .tooltip("Version of the spec file."),
    ])
}

pub fn n8n_plugin() -> EngineResult<SpecPlugin> {
    let registry = spec_registry()?;
    let schema = config_schema(&registry);

    let parse_options = ParseOptions::default()
        .with_action_label(|_, _, operation| operation.summary.clone())
        .with_action_description(|_, _, operation| operation.description.clone());

    Ok(SpecPlugin::new(
        PluginMetadata::new(PLUGIN_ID, "n8n", "n8n.svg", "Workflow"),
        schema,
        registry,
    )?
    .with_normalizer(server_url_normalizer())
    .with_parse_options(parse_options)
    .with_credentials(map_credentials))
}

/// Registrar hooked into [`crate::registrars`]
pub fn register(registry: &mut PluginRegistry, executor: &Executor) -> EngineResult<()> {
    registry.register(Arc::new(n8n_plugin()?.with_executor(executor.clone())))
}
