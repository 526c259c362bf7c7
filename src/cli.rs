//! Shared helpers for the command-line tools

use crate::config::{load_config, Config, LoggingConfig};
use crate::error::LedgerError;
use crate::scenario::{BuiltScenario, Scenario};
use std::path::Path;
use tracing::info;

/// Installs the global fmt subscriber. A second call is a no-op.
pub fn init_logging(logging: &LoggingConfig) -> Result<(), LedgerError> {
    let level = logging.max_level()?;
    // try_init fails only when a subscriber is already set, which is fine
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(logging.ansi)
        .with_target(false)
        .try_init();
    Ok(())
}

/// Loads the config, initializes logging and builds the scenario to replay.
/// `scenario_override` takes precedence over `replay.scenario`.
pub fn load_scenario_from_config(
    config_path: impl AsRef<Path>,
    scenario_override: Option<&Path>,
) -> Result<(Config, BuiltScenario), LedgerError> {
    let config = load_config(config_path)?;
    init_logging(&config.logging)?;

    let scenario_path = scenario_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.replay.scenario.clone().into());
    info!(scenario = %scenario_path.display(), "loading scenario");

    let built = Scenario::load(&scenario_path)?.build()?;
    Ok((config, built))
}
