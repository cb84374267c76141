//! Run one action, or print its redacted request with `--dry-run`

use crate::{cli::OutputFormat, error::CliResult};
use openquery_core::ActionResult;
use openquery_plugins::{ActionData, ConfigValues, PluginRegistry};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info};

/// Everything `openquery run` needs besides the registry
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub plugin: String,
    pub action: ActionData,
    pub format: OutputFormat,
    pub show_metadata: bool,
    pub dry_run: bool,
}

pub struct RunCommand;

impl RunCommand {
    pub async fn run(
        registry: &PluginRegistry,
        values: &ConfigValues,
        options: RunOptions,
    ) -> CliResult<()> {
        println!("{}", Self::render(registry, values, &options).await?);
        Ok(())
    }

    pub async fn render(
        registry: &PluginRegistry,
        values: &ConfigValues,
        options: &RunOptions,
    ) -> CliResult<String> {
        let plugin = registry.require(&options.plugin)?;

        let output = if options.dry_run {
            let request = plugin.prepare(&options.action, values)?.redacted();
            debug!(plugin = %options.plugin, action = %options.action.action_name, "dry run");
            request.to_value()
        } else {
            info!(plugin = %options.plugin, action = %options.action.action_name, "running action");
            let result = plugin.run(&options.action, values).await?;
            Self::result_to_json(result, options.show_metadata)
        };

        Ok(options.format.format_json(&output)?)
    }

    fn result_to_json(result: ActionResult, show_metadata: bool) -> JsonValue {
        if show_metadata {
            json!({
                "status": result.status,
                "headers": result.headers,
                "body": result.body.into_value(),
            })
        } else {
            result.body.into_value()
        }
    }
}
