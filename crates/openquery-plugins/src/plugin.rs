//! Data source plugin contract

use crate::config_schema::{ConfigValues, DataSourceConfigSchema};
use async_trait::async_trait;
use openquery_core::{ActionResult, EngineResult, ParameterValues, PreparedRequest, QueryConfig};
use serde::{Deserialize, Serialize};

/// Identity of a plugin as shown in the data source picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub category: String,
}

impl PluginMetadata {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        icon: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            category: category.into(),
        }
    }
}

/// The action a user picked in the query panel, with its parameter values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionData {
    pub action_name: String,
    #[serde(default)]
    pub parameters: ParameterValues,
}

impl ActionData {
    pub fn new(action_name: impl Into<String>, parameters: ParameterValues) -> Self {
        Self {
            action_name: action_name.into(),
            parameters,
        }
    }
}

/// A vendor adapter exposing an API as a query data source
#[async_trait]
pub trait DataSourcePlugin: Send + Sync {
    fn metadata(&self) -> &PluginMetadata;

    fn id(&self) -> &str {
        &self.metadata().id
    }

    fn name(&self) -> &str {
        &self.metadata().name
    }

    fn icon(&self) -> &str {
        &self.metadata().icon
    }

    fn category(&self) -> &str {
        &self.metadata().category
    }

    /// Form the host renders to configure a data source
    fn data_source_config(&self) -> &DataSourceConfigSchema;

    /// Grouped action catalog for the configured data source
    fn query_config(&self, values: &ConfigValues) -> EngineResult<QueryConfig>;

    /// Build the request for an action without sending it
    fn prepare(&self, action: &ActionData, values: &ConfigValues) -> EngineResult<PreparedRequest>;

    async fn run(&self, action: &ActionData, values: &ConfigValues) -> EngineResult<ActionResult>;
}
