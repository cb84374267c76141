//! Utility functions for the CLI

use crate::error::{CliError, CliResult};
use anyhow::Context;
use colored::{ColoredString, Colorize};
use openquery_core::ParameterValues;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize tracing on stderr; `verbose` forces debug level
pub fn init_tracing(verbose: bool) -> CliResult<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CliError::General(format!("Failed to set tracing subscriber: {}", e)))?;

    Ok(())
}

/// Utility for colored console output
pub struct ColoredOutput;

impl ColoredOutput {
    pub fn success(msg: &str) -> ColoredString {
        msg.green().bold()
    }

    pub fn error(msg: &str) -> ColoredString {
        msg.red().bold()
    }

    pub fn warning(msg: &str) -> ColoredString {
        msg.yellow().bold()
    }

    pub fn info(msg: &str) -> ColoredString {
        msg.blue()
    }

    pub fn dim(msg: &str) -> ColoredString {
        msg.dimmed()
    }

    pub fn highlight(msg: &str) -> ColoredString {
        msg.cyan().bold()
    }
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Read action parameters from either a JSON argument or a JSON/YAML file
pub fn read_input_data(
    input: Option<String>,
    input_file: Option<String>,
) -> CliResult<ParameterValues> {
    let value = match (input, input_file) {
        (Some(_), Some(_)) => {
            return Err(CliError::InvalidArgument(
                "--input and --input-file are mutually exclusive".to_string(),
            ))
        }
        (Some(input_str), None) => serde_json::from_str(&input_str)
            .map_err(|e| CliError::InvalidArgument(format!("Invalid JSON input: {}", e)))?,
        (None, Some(file_path)) => {
            if !std::path::Path::new(&file_path).exists() {
                return Err(CliError::FileNotFound(file_path));
            }
            let content = std::fs::read_to_string(&file_path)
                .with_context(|| format!("Failed to read input file '{}'", file_path))?;

            // JSON first, then YAML
            match serde_json::from_str::<serde_json::Value>(&content) {
                Ok(json_data) => json_data,
                Err(_) => serde_yaml::from_str(&content).map_err(|e| {
                    CliError::InvalidArgument(format!(
                        "Invalid JSON/YAML input file '{}': {}",
                        file_path, e
                    ))
                })?,
            }
        }
        (None, None) => return Ok(ParameterValues::new()),
    };

    match value {
        serde_json::Value::Object(map) => Ok(map),
        serde_json::Value::Null => Ok(ParameterValues::new()),
        _ => Err(CliError::InvalidArgument(
            "action input must be a JSON object".to_string(),
        )),
    }
}
