//! Process-wide runtime settings
//!
//! Log level, input mode, the default timed-disable duration and the
//! input-mode toggle cooldown live in one struct shared between the
//! foreground dispatch loop and the background re-enable task.

use crate::config::ToggleConfig;
use crate::error::{ToggleError, ToggleResult};
use crate::validation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Status verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only transitions and failures
    Minimal,
    /// Per-adapter notices and the refresh table
    #[default]
    Detailed,
}

impl LogLevel {
    pub fn toggled(self) -> Self {
        match self {
            LogLevel::Minimal => LogLevel::Detailed,
            LogLevel::Detailed => LogLevel::Minimal,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Minimal => write!(f, "Minimal"),
            LogLevel::Detailed => write!(f, "Detailed"),
        }
    }
}

/// How key input is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMode {
    /// Sample held keys every tick
    #[serde(rename = "global", alias = "poll")]
    GlobalPoll,
    /// Wait for one key press at a time
    #[serde(rename = "local", alias = "blocking")]
    BlockingRead,
}

impl InputMode {
    pub fn toggled(self) -> Self {
        match self {
            InputMode::GlobalPoll => InputMode::BlockingRead,
            InputMode::BlockingRead => InputMode::GlobalPoll,
        }
    }

    /// Map the startup prompt answer ('1' or '2') to a mode
    pub fn from_choice(choice: char) -> ToggleResult<Self> {
        match choice {
            '1' => Ok(InputMode::GlobalPoll),
            '2' => Ok(InputMode::BlockingRead),
            other => Err(ToggleError::InvalidCommand(format!(
                "input mode choice must be 1 or 2, got {:?}",
                other
            ))),
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            InputMode::GlobalPoll => "Global Key Detection",
            InputMode::BlockingRead => "Application-Specific Key Input",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::GlobalPoll => write!(f, "global"),
            InputMode::BlockingRead => write!(f, "local"),
        }
    }
}

impl std::str::FromStr for InputMode {
    type Err = ToggleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "global" | "poll" | "1" => Ok(InputMode::GlobalPoll),
            "local" | "blocking" | "2" => Ok(InputMode::BlockingRead),
            other => Err(ToggleError::InvalidCommand(format!("unknown input mode '{}'", other))),
        }
    }
}

/// Mutable state shared by every component
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_level: LogLevel,
    pub input_mode: InputMode,
    /// None means draw a random 5-10s duration on the next timed disable
    pub disable_duration_secs: Option<u64>,
    pub mode_toggle_cooldown: Duration,
    last_mode_toggle: Option<Instant>,
}

pub type SharedSettings = Arc<RwLock<Settings>>;

impl Settings {
    pub fn new(input_mode: InputMode) -> Self {
        Self {
            log_level: LogLevel::default(),
            input_mode,
            disable_duration_secs: None,
            mode_toggle_cooldown: Duration::from_millis(crate::config::MIN_MODE_TOGGLE_COOLDOWN_MS),
            last_mode_toggle: None,
        }
    }

    pub fn from_config(config: &ToggleConfig, input_mode: InputMode) -> Self {
        Self {
            log_level: config.log_level,
            input_mode,
            disable_duration_secs: config.disable_duration_secs,
            mode_toggle_cooldown: config.mode_toggle_cooldown(),
            last_mode_toggle: None,
        }
    }

    pub fn shared(self) -> SharedSettings {
        Arc::new(RwLock::new(self))
    }

    pub fn is_detailed(&self) -> bool {
        self.log_level == LogLevel::Detailed
    }

    pub fn toggle_log_level(&mut self) -> LogLevel {
        self.log_level = self.log_level.toggled();
        self.log_level
    }

    /// Flip the input mode unless the previous flip is still inside the cooldown.
    ///
    /// Returns the new mode, or `None` when the toggle was absorbed.
    pub fn toggle_input_mode(&mut self, now: Instant) -> Option<InputMode> {
        if let Some(last) = self.last_mode_toggle {
            if now.saturating_duration_since(last) < self.mode_toggle_cooldown {
                return None;
            }
        }
        self.last_mode_toggle = Some(now);
        self.input_mode = self.input_mode.toggled();
        Some(self.input_mode)
    }

    /// Store a new default duration; the previous value survives a rejected one.
    pub fn set_disable_duration(&mut self, seconds: u64) -> ToggleResult<u64> {
        let seconds = validation::validate_disable_duration(seconds)?;
        self.disable_duration_secs = Some(seconds);
        Ok(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_toggle() {
        let mut settings = Settings::new(InputMode::GlobalPoll);
        assert_eq!(settings.log_level, LogLevel::Detailed);
        assert_eq!(settings.toggle_log_level(), LogLevel::Minimal);
        assert!(!settings.is_detailed());
        assert_eq!(settings.toggle_log_level(), LogLevel::Detailed);
    }

    #[test]
    fn test_mode_toggle_within_cooldown_changes_once() {
        let mut settings = Settings::new(InputMode::GlobalPoll);
        let start = Instant::now();

        assert_eq!(settings.toggle_input_mode(start), Some(InputMode::BlockingRead));
        assert_eq!(settings.toggle_input_mode(start + Duration::from_millis(200)), None);
        assert_eq!(settings.input_mode, InputMode::BlockingRead);
    }

    #[test]
    fn test_mode_toggle_after_cooldown() {
        let mut settings = Settings::new(InputMode::BlockingRead);
        let start = Instant::now();

        assert_eq!(settings.toggle_input_mode(start), Some(InputMode::GlobalPoll));
        assert_eq!(
            settings.toggle_input_mode(start + Duration::from_millis(1000)),
            Some(InputMode::BlockingRead)
        );
    }

    #[test]
    fn test_absorbed_toggle_does_not_extend_cooldown() {
        let mut settings = Settings::new(InputMode::GlobalPoll);
        let start = Instant::now();

        settings.toggle_input_mode(start);
        assert!(settings.toggle_input_mode(start + Duration::from_millis(900)).is_none());
        assert!(settings.toggle_input_mode(start + Duration::from_millis(1100)).is_some());
    }

    #[test]
    fn test_set_disable_duration() {
        let mut settings = Settings::new(InputMode::GlobalPoll);
        assert!(settings.set_disable_duration(3).is_err());
        assert_eq!(settings.disable_duration_secs, None);

        assert_eq!(settings.set_disable_duration(7).unwrap(), 7);
        assert!(settings.set_disable_duration(4).is_err());
        assert_eq!(settings.disable_duration_secs, Some(7));
    }

    #[test]
    fn test_input_mode_choice() {
        assert_eq!(InputMode::from_choice('1').unwrap(), InputMode::GlobalPoll);
        assert_eq!(InputMode::from_choice('2').unwrap(), InputMode::BlockingRead);
        assert!(matches!(
            InputMode::from_choice('x'),
            Err(ToggleError::InvalidCommand(_))
        ));
        assert_eq!("LOCAL".parse::<InputMode>().unwrap(), InputMode::BlockingRead);
        assert!("remote".parse::<InputMode>().is_err());
    }
}
