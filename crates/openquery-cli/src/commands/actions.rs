//! Print the action catalog of a data source

use crate::{
    cli::OutputFormat,
    error::CliResult,
    utils::{truncate_text, ColoredOutput},
};
use openquery_core::QueryConfig;
use openquery_plugins::{ConfigValues, PluginRegistry};
use std::fmt::Write;
use tracing::debug;

pub struct ActionsCommand;

impl ActionsCommand {
    pub fn run(
        registry: &PluginRegistry,
        plugin_id: &str,
        values: &ConfigValues,
        format: OutputFormat,
    ) -> CliResult<()> {
        println!("{}", Self::render(registry, plugin_id, values, format)?);
        Ok(())
    }

    pub fn render(
        registry: &PluginRegistry,
        plugin_id: &str,
        values: &ConfigValues,
        format: OutputFormat,
    ) -> CliResult<String> {
        let plugin = registry.require(plugin_id)?;
        let query_config = plugin.query_config(values)?;
        debug!(plugin = plugin_id, actions = query_config.actions.len(), "loaded catalog");

        match format {
            OutputFormat::Table => Ok(Self::table(&query_config)),
            _ => Ok(format.format_json(&serde_json::to_value(&query_config)?)?),
        }
    }

    fn table(config: &QueryConfig) -> String {
        let mut out = String::new();
        if config.actions.is_empty() {
            return ColoredOutput::info("No actions found").to_string();
        }

        let _ = writeln!(
            out,
            "{}",
            ColoredOutput::success(&format!("Found {} action(s):", config.actions.len()))
        );

        for category in &config.categories.items {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", ColoredOutput::highlight(&category.label));
            for id in &category.action_ids {
                let Some(action) = config.actions.iter().find(|a| &a.id == id) else {
                    continue;
                };
                let _ = writeln!(
                    out,
                    "  {:<28} {:<7} {:<36} {}",
                    truncate_text(&action.id, 28),
                    action.method,
                    truncate_text(&action.path, 36),
                    ColoredOutput::dim(&truncate_text(&action.label, 48))
                );
            }
        }
        out.trim_end().to_string()
    }
}
