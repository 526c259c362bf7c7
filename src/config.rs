//! Configuration management for EpochLedger tooling

use crate::error::LedgerError;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_ansi")]
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            ansi: default_ansi(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReplayConfig {
    #[serde(default = "default_scenario")]
    pub scenario: String,
    #[serde(default = "default_show_pool")]
    pub show_pool: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            scenario: default_scenario(),
            show_pool: default_show_pool(),
        }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<tracing::Level, LedgerError> {
        self.level.parse().map_err(|_| {
            LedgerError::ConfigError(format!("logging.level '{}' is not a valid level", self.level))
        })
    }
}

/// Loads the configuration at `path`, falling back to defaults when the file
/// is absent or empty.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, LedgerError> {
    let config_str = match fs::read_to_string(path.as_ref()) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(LedgerError::ConfigError(format!(
                "Cannot read {}: {}",
                path.as_ref().display(),
                e
            )))
        }
    };
    let config: Config = if config_str.trim().is_empty() {
        Config::default()
    } else {
        toml::from_str(&config_str)?
    };

    config.logging.max_level()?;

    if config.replay.scenario.is_empty() {
        return Err(LedgerError::ConfigError(
            "replay.scenario must be set in config.toml".to_string(),
        ));
    }

    Ok(config)
}

fn default_level() -> String {
    "info".to_string()
}

fn default_ansi() -> bool {
    true
}

fn default_scenario() -> String {
    "scenario.toml".to_string()
}

fn default_show_pool() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config("/nonexistent/epochledger/config.toml").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.logging.max_level().unwrap(), tracing::Level::INFO);
    }

    #[test]
    fn test_unreadable_path_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
        // A directory exists but cannot be read as a file
        let dir = tempfile::tempdir()?;

        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, LedgerError::ConfigError(_)));
        assert!(err.to_string().contains("Cannot read"));
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[logging]\nlevel = \"debug\"")?;

        let config = load_config(file.path())?;
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.ansi);
        assert_eq!(config.replay.scenario, "scenario.toml");
        Ok(())
    }

    #[test]
    fn test_invalid_level_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[logging]\nlevel = \"loud\"")?;

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, LedgerError::ConfigError(_)));
        Ok(())
    }

    #[test]
    fn test_empty_scenario_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[replay]\nscenario = \"\"")?;

        assert!(load_config(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_malformed_toml_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[logging\nlevel = ")?;

        assert!(matches!(
            load_config(file.path()),
            Err(LedgerError::ConfigError(_))
        ));
        Ok(())
    }
}
