//! Engine configuration
//!
//! Read from a TOML file. Every field has a default, so a partial file is
//! fine and a missing file yields [`EngineConfig::default`].

use crate::dates::TimePeriod;
use crate::error::ComputeError;
use crate::trends::DEFAULT_ROLLING_WINDOW;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File name looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "lifeflow.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub insights: InsightsSection,
    pub output: OutputSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsSection {
    /// Lookback for trends, heatmaps and habit rates
    pub period: TimePeriod,
    /// Number of entries in the rolling score average
    pub rolling_window: usize,
    /// Leave out streaks that have never started
    pub hide_empty_streaks: bool,
}

impl Default for InsightsSection {
    fn default() -> Self {
        Self {
            period: TimePeriod::Month,
            rolling_window: DEFAULT_ROLLING_WINDOW,
            hide_empty_streaks: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub pretty: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self { pretty: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// `tracing` filter directive, e.g. "info" or "lifeflow_engine=debug"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ComputeError> {
        toml::from_str(s).map_err(|e| ComputeError::ConfigError(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ComputeError> {
        toml::to_string_pretty(self).map_err(|e| ComputeError::ConfigError(e.to_string()))
    }

    /// Load from `path`; a file that does not exist gives the defaults
    pub fn load(path: &Path) -> Result<Self, ComputeError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s).map_err(|e| match e {
            ComputeError::ConfigError(msg) => {
                ComputeError::ConfigError(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Load `path` if given, otherwise [`DEFAULT_CONFIG_FILE`]
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ComputeError> {
        Self::load(path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE)))
    }

    pub fn save(&self, path: &Path) -> Result<(), ComputeError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.insights.period, TimePeriod::Month);
        assert_eq!(config.insights.rolling_window, 7);
        assert!(config.insights.hide_empty_streaks);
        assert!(config.output.pretty);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [insights]
            period = "90d"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.insights.period, TimePeriod::Quarter);
        assert_eq!(config.insights.rolling_window, 7);
        assert!(config.output.pretty);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let result = EngineConfig::from_toml_str("[insights]\nperiod = \"1y\"\n");
        assert!(matches!(result, Err(ComputeError::ConfigError(_))));

        let result = EngineConfig::from_toml_str("insights = [");
        assert!(matches!(result, Err(ComputeError::ConfigError(_))));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("lifeflow-config-does-not-exist.toml");
        assert_eq!(EngineConfig::load(&path).unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "lifeflow-config-{}.toml",
            uuid::Uuid::new_v4()
        ));
        let mut config = EngineConfig::default();
        config.insights.period = TimePeriod::Week;
        config.output.pretty = false;

        config.save(&path).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, config);
    }
}
