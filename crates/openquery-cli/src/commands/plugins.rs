//! List registered data source plugins

use crate::{cli::OutputFormat, error::CliResult, utils::ColoredOutput};
use openquery_plugins::PluginRegistry;
use serde_json::{json, Value as JsonValue};
use std::fmt::Write;

pub struct PluginsCommand;

impl PluginsCommand {
    pub fn run(registry: &PluginRegistry, format: OutputFormat) -> CliResult<()> {
        println!("{}", Self::render(registry, format)?);
        Ok(())
    }

    pub fn render(registry: &PluginRegistry, format: OutputFormat) -> CliResult<String> {
        if format != OutputFormat::Table {
            return Ok(format.format_json(&Self::to_json(registry))?);
        }

        if registry.is_empty() {
            return Ok(ColoredOutput::info("No plugins registered").to_string());
        }

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<12} {:<16} {:<12}",
            ColoredOutput::highlight("ID"),
            ColoredOutput::highlight("Name"),
            ColoredOutput::highlight("Category")
        );
        let _ = writeln!(out, "{}", "-".repeat(40));
        for plugin in registry.plugins() {
            let _ = writeln!(
                out,
                "{:<12} {:<16} {:<12}",
                plugin.id(),
                plugin.name(),
                plugin.category()
            );
        }
        Ok(out.trim_end().to_string())
    }

    fn to_json(registry: &PluginRegistry) -> JsonValue {
        json!({
            "plugins": registry.plugins().map(|p| json!({
                "id": p.id(),
                "name": p.name(),
                "icon": p.icon(),
                "category": p.category(),
                "dataSourceConfig": p.data_source_config(),
            })).collect::<Vec<_>>()
        })
    }
}
