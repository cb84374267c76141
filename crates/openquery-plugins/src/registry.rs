//! Statically assembled set of data source plugins

use crate::plugin::DataSourcePlugin;
use indexmap::IndexMap;
use openquery_core::{EngineError, EngineResult, Executor};
use std::sync::Arc;

/// Function a plugin module exposes to add itself to a registry
///
/// Registered plugins send their requests through the given executor.
pub type PluginRegistrar = fn(&mut PluginRegistry, &Executor) -> EngineResult<()>;

#[derive(Default)]
pub struct PluginRegistry {
    plugins: IndexMap<String, Arc<dyn DataSourcePlugin>>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry by running each registrar in order
    pub fn from_registrars(
        registrars: &[PluginRegistrar],
        executor: &Executor,
    ) -> EngineResult<Self> {
        let mut registry = Self::new();
        for registrar in registrars {
            registrar(&mut registry, executor)?;
        }
        Ok(registry)
    }

    /// Registry from an explicit plugin list
    pub fn from_plugins<I>(plugins: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = Arc<dyn DataSourcePlugin>>,
    {
        let mut registry = Self::new();
        for plugin in plugins {
            registry.register(plugin)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, plugin: Arc<dyn DataSourcePlugin>) -> EngineResult<()> {
        let id = plugin.id().to_string();
        if self.plugins.contains_key(&id) {
            return Err(EngineError::config(format!(
                "plugin registered twice: {}",
                id
            )));
        }
        tracing::debug!(plugin = %id, "registered data source plugin");
        self.plugins.insert(id, plugin);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn DataSourcePlugin>> {
        self.plugins.get(id).cloned()
    }

    /// Like [`PluginRegistry::get`], with a config error naming the unknown id
    pub fn require(&self, id: &str) -> EngineResult<Arc<dyn DataSourcePlugin>> {
        self.get(id)
            .ok_or_else(|| EngineError::config(format!("unknown plugin: {}", id)))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    pub fn plugins(&self) -> impl Iterator<Item = &Arc<dyn DataSourcePlugin>> {
        self.plugins.values()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
