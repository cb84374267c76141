//! OpenQuery CLI main entry point

use clap::Parser;
use openquery_cli::{
    cli::{Cli, Commands},
    commands::{build_registry, run::RunOptions, ActionsCommand, PluginsCommand, RunCommand},
    config::ConfigLoader,
    error::{CliError, CliResult},
    utils::{init_tracing, read_input_data, ColoredOutput},
};
use openquery_plugins::ActionData;
use std::time::Duration;
use tracing::debug;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            report(&e);
            1
        }
    };

    std::process::exit(exit_code);
}

/// Engine failures are printed as their classified JSON form
fn report(error: &CliError) {
    eprintln!("{} {}", ColoredOutput::error("Error:"), error);
    if let Some(engine) = error.engine() {
        if let Ok(classified) = serde_json::to_string_pretty(&engine.classify()) {
            eprintln!("{}", classified);
        }
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose)?;

    if cli.no_color {
        colored::control::set_override(false);
    }

    debug!("OpenQuery CLI v{}", env!("CARGO_PKG_VERSION"));

    let registry = build_registry(Duration::from_secs(cli.timeout))?;

    match cli.command {
        Commands::Plugins { format } => PluginsCommand::run(&registry, format),

        Commands::Actions {
            plugin,
            config,
            format,
        } => {
            let values = ConfigLoader::new().load_from_file(&config).await?;
            ActionsCommand::run(&registry, &plugin, &values, format)
        }

        Commands::Run {
            plugin,
            config,
            action,
            input,
            input_file,
            format,
            show_metadata,
            dry_run,
        } => {
            let values = ConfigLoader::new().load_from_file(&config).await?;
            let parameters = read_input_data(input, input_file)?;
            let options = RunOptions {
                plugin,
                action: ActionData::new(action, parameters),
                format,
                show_metadata,
                dry_run,
            };
            RunCommand::run(&registry, &values, options).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openquery_cli::cli::OutputFormat;

    #[test]
    fn test_plugins_parsing() {
        let cli = Cli::try_parse_from(["openquery", "--no-color", "plugins"]).unwrap();
        assert!(cli.no_color);
        assert!(matches!(
            cli.command,
            Commands::Plugins {
                format: OutputFormat::Table
            }
        ));
    }

    #[test]
    fn test_run_command_parsing() {
        let cli = Cli::try_parse_from([
            "openquery",
            "run",
            "--plugin",
            "n8n",
            "--config",
            "n8n.yaml",
            "--action",
            "getWorkflow",
            "--input",
            r#"{"id": "wf1"}"#,
            "--dry-run",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        if let Commands::Run {
            plugin,
            config,
            action,
            input,
            dry_run,
            format,
            ..
        } = cli.command
        {
            assert_eq!(plugin, "n8n");
            assert_eq!(config.to_str(), Some("n8n.yaml"));
            assert_eq!(action, "getWorkflow");
            assert_eq!(input, Some(r#"{"id": "wf1"}"#.to_string()));
            assert!(dry_run);
            assert_eq!(format, OutputFormat::Pretty);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_input_and_input_file_conflict() {
        let result = Cli::try_parse_from([
            "openquery",
            "run",
            "-p",
            "n8n",
            "-c",
            "n8n.yaml",
            "-a",
            "getTags",
            "--input",
            "{}",
            "--input-file",
            "in.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_actions_parsing() {
        let cli = Cli::try_parse_from([
            "openquery",
            "actions",
            "--plugin",
            "openapi",
            "--config",
            "petstore.json",
            "--format",
            "json",
        ])
        .unwrap();

        if let Commands::Actions { plugin, format, .. } = cli.command {
            assert_eq!(plugin, "openapi");
            assert_eq!(format, OutputFormat::Json);
        } else {
            panic!("Expected Actions command");
        }
    }
}
