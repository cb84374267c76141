pub mod actions;
pub mod plugins;
pub mod run;

// Re-export command handlers
pub use actions::ActionsCommand;
pub use plugins::PluginsCommand;
pub use run::RunCommand;

use crate::error::CliResult;
use openquery_core::{Executor, TransportSettings};
use openquery_plugins::{registry_with_executor, PluginRegistry};
use std::time::Duration;

/// Every enabled plugin, sharing one executor with the given timeout
pub fn build_registry(timeout: Duration) -> CliResult<PluginRegistry> {
    let executor = Executor::with_settings(&TransportSettings::default().with_timeout(timeout))?;
    Ok(registry_with_executor(&executor)?)
}
