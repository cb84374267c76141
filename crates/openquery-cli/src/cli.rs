//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use serde_json::Value as JsonValue;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "openquery",
    about = "OpenQuery - run API actions described by OpenAPI documents",
    version,
    author = "TRS Team"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,

    /// Request timeout in seconds
    #[arg(
        long,
        global = true,
        env = "OPENQUERY_TIMEOUT_SECS",
        default_value = "30",
        help = "HTTP request timeout in seconds"
    )]
    pub timeout: u64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available data source plugins
    Plugins {
        /// Output format
        #[arg(long, value_enum, default_value = "table", help = "Output format")]
        format: OutputFormat,
    },

    /// Print the action catalog of a configured data source
    Actions {
        #[arg(short, long, help = "Plugin id (e.g., n8n)")]
        plugin: String,

        /// Data source config file (YAML or JSON)
        #[arg(short, long, env = "OPENQUERY_CONFIG", help = "Data source config file")]
        config: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "table", help = "Output format")]
        format: OutputFormat,
    },

    /// Run an action against a configured data source
    Run {
        #[arg(short, long, help = "Plugin id (e.g., n8n)")]
        plugin: String,

        /// Data source config file (YAML or JSON)
        #[arg(short, long, env = "OPENQUERY_CONFIG", help = "Data source config file")]
        config: PathBuf,

        /// Action id from the catalog
        #[arg(short, long, help = "Action id (e.g., getWorkflows)")]
        action: String,

        /// Input data as JSON string
        #[arg(short, long, help = "Action parameters as a JSON object")]
        input: Option<String>,

        /// Input data from file
        #[arg(
            long,
            conflicts_with = "input",
            help = "Read action parameters from file (JSON or YAML)"
        )]
        input_file: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "pretty", help = "Output format")]
        format: OutputFormat,

        /// Show status and headers next to the body
        #[arg(long, help = "Include response status and headers in output")]
        show_metadata: bool,

        /// Build the request without sending it
        #[arg(long, help = "Print the redacted request instead of sending it")]
        dry_run: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Debug, PartialEq)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// Pretty-printed JSON
    Pretty,
    /// Compact JSON
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    /// Format a JSON value according to the output format
    pub fn format_json(&self, value: &JsonValue) -> Result<String, serde_json::Error> {
        match self {
            // Commands render their own tables; anything else falls back to pretty JSON
            Self::Table | Self::Pretty => serde_json::to_string_pretty(value),
            Self::Json => serde_json::to_string(value),
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| {
                serde_json::Error::io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("YAML serialization error: {}", e),
                ))
            }),
        }
    }
}
