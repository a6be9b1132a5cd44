//! Configuration management for nettoggle

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::error::{ToggleError, ToggleResult};
use crate::settings::{InputMode, LogLevel};
use crate::validation;

/// Cooldown floor between input-mode toggles
pub const MIN_MODE_TOGGLE_COOLDOWN_MS: u64 = 1000;

/// Main nettoggle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleConfig {
    /// Poll tick in global input mode (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Minimum time between two input-mode toggles (milliseconds)
    #[serde(default = "default_mode_toggle_cooldown_ms")]
    pub mode_toggle_cooldown_ms: u64,
    /// Default timed-disable duration; random 5-10s when unset
    #[serde(default)]
    pub disable_duration_secs: Option<u64>,
    /// Initial status verbosity
    #[serde(default)]
    pub log_level: LogLevel,
    /// Initial input mode; the operator is prompted when unset
    #[serde(default)]
    pub input_mode: Option<InputMode>,
    /// Adapters never touched by bulk operations
    #[serde(default = "default_excluded_interfaces")]
    pub excluded_interfaces: Vec<String>,
    /// Re-read adapter state after each transition
    #[serde(default = "default_verify_transitions")]
    pub verify_transitions: bool,
}

fn default_poll_interval_ms() -> u64 {
    20
}

fn default_mode_toggle_cooldown_ms() -> u64 {
    MIN_MODE_TOGGLE_COOLDOWN_MS
}

fn default_excluded_interfaces() -> Vec<String> {
    vec!["lo".to_string()]
}

fn default_verify_transitions() -> bool {
    true
}

/// Default configuration file location
pub fn default_config_path() -> PathBuf {
    PathBuf::from("/etc/nettoggle/nettoggle.toml")
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            mode_toggle_cooldown_ms: default_mode_toggle_cooldown_ms(),
            disable_duration_secs: None,
            log_level: LogLevel::default(),
            input_mode: None,
            excluded_interfaces: default_excluded_interfaces(),
            verify_transitions: default_verify_transitions(),
        }
    }
}

impl ToggleConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> ToggleResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ToggleError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Load configuration from file, falling back to defaults when it does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> ToggleResult<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> ToggleResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ToggleError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> ToggleResult<()> {
        if self.poll_interval_ms == 0 || self.poll_interval_ms > 500 {
            return Err(ToggleError::Config(format!(
                "poll_interval_ms must be between 1 and 500 (got {})",
                self.poll_interval_ms
            )));
        }

        if let Some(seconds) = self.disable_duration_secs {
            validation::validate_disable_duration(seconds)
                .map_err(|e| ToggleError::Config(format!("disable_duration_secs: {}", e)))?;
        }

        for name in &self.excluded_interfaces {
            validation::validate_interface_name(name)
                .map_err(|e| ToggleError::Config(format!("excluded_interfaces: {}", e)))?;
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Cooldown, raised to the one second floor
    pub fn mode_toggle_cooldown(&self) -> Duration {
        Duration::from_millis(self.mode_toggle_cooldown_ms.max(MIN_MODE_TOGGLE_COOLDOWN_MS))
    }
}
