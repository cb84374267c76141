use openquery_core::{EngineResult, Executor, TransportSettings};

pub mod config_schema;
pub mod plugin;
pub mod registry;
pub mod spec_plugin;

// Conditional compilation for each vendor
#[cfg(feature = "n8n")]
pub mod n8n;

#[cfg(feature = "openapi")]
pub mod openapi;

// Re-export commonly used types
pub use config_schema::{ConfigField, ConfigValues, DataSourceConfigSchema, FieldType};
pub use plugin::{ActionData, DataSourcePlugin, PluginMetadata};
pub use registry::{PluginRegistrar, PluginRegistry};
pub use spec_plugin::{CredentialMapper, SpecPlugin};

#[cfg(feature = "n8n")]
pub use n8n::n8n_plugin;

#[cfg(feature = "openapi")]
pub use openapi::OpenApiPlugin;

/// Return all enabled registrars based on crate features
pub fn registrars() -> Vec<PluginRegistrar> {
    let mut list: Vec<PluginRegistrar> = Vec::new();

    #[cfg(feature = "n8n")]
    list.push(n8n::register);

    #[cfg(feature = "openapi")]
    list.push(openapi::register);

    list
}

/// Registry holding every plugin enabled at build time, sharing `executor`
pub fn registry_with_executor(executor: &Executor) -> EngineResult<PluginRegistry> {
    PluginRegistry::from_registrars(&registrars(), executor)
}

/// [`registry_with_executor`] with default transport settings
pub fn default_registry() -> EngineResult<PluginRegistry> {
    registry_with_executor(&Executor::with_settings(&TransportSettings::default())?)
}
