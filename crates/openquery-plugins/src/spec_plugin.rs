//! Reusable adapter for vendors described by bundled OpenAPI documents

use crate::config_schema::{string_value, ConfigValues, DataSourceConfigSchema};
use crate::plugin::{ActionData, DataSourcePlugin, PluginMetadata};
use async_trait::async_trait;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use openquery_core::{
    Action, ActionCatalog, ActionResult, DataSourceConfig, Document, DocumentParser,
    DynamicParamsConfig, EngineError, EngineResult, Executor, ParseOptions, PreparedRequest,
    QueryConfig, RunRequest, ServerUrlNormalizer, SpecRegistry, TransportSettings,
};
use std::sync::Arc;
use tracing::debug;

/// Maps form values onto `<Scheme>.<field>` credentials
pub type CredentialMapper = fn(&ConfigValues) -> DynamicParamsConfig;

pub const DEFAULT_QUERY_LABEL: &str = "Operation";
pub const DEFAULT_CATEGORY_LABEL: &str = "Resource";

fn no_credentials(_: &ConfigValues) -> DynamicParamsConfig {
    DynamicParamsConfig::new()
}

/// Look up an action by id, as picked in the query panel
pub(crate) fn find_action<'c>(catalog: &'c ActionCatalog, name: &str) -> EngineResult<&'c Action> {
    catalog
        .action(name)
        .ok_or_else(|| EngineError::validation(format!("unknown action '{}'", name)))
}

pub struct SpecPlugin {
    metadata: PluginMetadata,
    schema: DataSourceConfigSchema,
    registry: SpecRegistry,
    normalizer: Option<ServerUrlNormalizer>,
    parse_options: ParseOptions,
    credentials: CredentialMapper,
    server_url_field: String,
    version_field: String,
    query_label: String,
    category_label: String,
    executor: Executor,
    /// Compiled lazily, once per version key
    catalogs: IndexMap<String, OnceCell<Arc<ActionCatalog>>>,
}

impl std::fmt::Debug for SpecPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecPlugin")
            .field("metadata", &self.metadata)
            .field("versions", &self.registry.versions().collect::<Vec<_>>())
            .field("normalizer", &self.normalizer)
            .finish_non_exhaustive()
    }
}

impl SpecPlugin {
    pub fn new(
        metadata: PluginMetadata,
        schema: DataSourceConfigSchema,
        registry: SpecRegistry,
    ) -> EngineResult<Self> {
        let catalogs = registry
            .versions()
            .map(|v| (v.to_string(), OnceCell::new()))
            .collect();
        Ok(Self {
            metadata,
            schema,
            registry,
            normalizer: None,
            parse_options: ParseOptions::default(),
            credentials: no_credentials,
            server_url_field: "serverURL".to_string(),
            version_field: "specVersion".to_string(),
            query_label: DEFAULT_QUERY_LABEL.to_string(),
            category_label: DEFAULT_CATEGORY_LABEL.to_string(),
            executor: Executor::with_settings(&TransportSettings::default())?,
            catalogs,
        })
    }

    pub fn with_normalizer(mut self, normalizer: ServerUrlNormalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    pub fn with_credentials(mut self, mapper: CredentialMapper) -> Self {
        self.credentials = mapper;
        self
    }

    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_labels(mut self, query_label: impl Into<String>, category_label: impl Into<String>) -> Self {
        self.query_label = query_label.into();
        self.category_label = category_label.into();
        self
    }

    pub fn registry(&self) -> &SpecRegistry {
        &self.registry
    }

    /// Version key picked in the form, if any
    fn requested_version(&self, values: &ConfigValues) -> Option<String> {
        string_value(values, &self.version_field)
    }

    /// Document and compiled catalog for a version; the catalog is built on first use
    pub fn catalog(
        &self,
        version: Option<&str>,
    ) -> EngineResult<(Arc<Document>, Arc<ActionCatalog>)> {
        let key = self.registry.resolve_version(version)?;
        let document = self.registry.resolve(Some(key))?;
        let cell = self
            .catalogs
            .get(key)
            .ok_or_else(|| EngineError::config(format!("unknown spec version: {}", key)))?;

        let catalog = cell
            .get_or_try_init(|| {
                debug!(plugin = %self.metadata.id, version = key, "compiling action catalog");
                DocumentParser::new(self.parse_options.clone())
                    .parse(&document)
                    .map(Arc::new)
            })?
            .clone();

        Ok((document, catalog))
    }

    /// Engine config for the form values; validates the form first
    pub fn data_source(&self, values: &ConfigValues) -> EngineResult<DataSourceConfig> {
        // an unknown version key is reported before the form's option check
        if let Some(version) = self.requested_version(values) {
            self.registry.resolve_version(Some(&version))?;
        }
        self.schema.validate(values)?;

        let server_url = string_value(values, &self.server_url_field).ok_or_else(|| {
            EngineError::config(format!("missing required field {}", self.server_url_field))
        })?;

        let mut config = DataSourceConfig::new(server_url)
            .with_dynamic_params((self.credentials)(values));
        if let Some(version) = self.requested_version(values) {
            config = config.with_spec_version(version);
        }
        if let Some(normalizer) = &self.normalizer {
            config = config.with_normalizer(normalizer.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

#[async_trait]
impl DataSourcePlugin for SpecPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    fn data_source_config(&self) -> &DataSourceConfigSchema {
        &self.schema
    }

    fn query_config(&self, values: &ConfigValues) -> EngineResult<QueryConfig> {
        let version = self.requested_version(values);
        let (_, catalog) = self.catalog(version.as_deref())?;
        Ok(catalog.to_query_config(self.query_label.as_str(), self.category_label.as_str()))
    }

    fn prepare(&self, action: &ActionData, values: &ConfigValues) -> EngineResult<PreparedRequest> {
        let config = self.data_source(values)?;
        let (document, catalog) = self.catalog(config.spec_version.as_deref())?;
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
        let (document, catalog) = self.catalog(config.spec_version.as_deref())?;
        let target = find_action(&catalog, &action.action_name)?;

        debug!(plugin = %self.metadata.id, action = %target.id, "running action");

        self.executor
            .run(&RunRequest::new(&document, target, &config, &action.parameters))
            .await
    }
}
