//! Error types for nettoggle

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToggleError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Command execution failed
    #[error("Command '{cmd}' failed{}: {stderr}", exit_code_suffix(.code))]
    CommandFailed { cmd: String, code: Option<i32>, stderr: String },
    /// A query or action against one adapter failed
    #[error("Provider error on '{adapter}': {reason}")]
    Provider { adapter: String, reason: String },
    /// User-supplied value rejected
    #[error("Invalid input: {0}")]
    Validation(String),
    /// Choice outside the recognized set
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
    /// Adapter not found
    #[error("Adapter not found: {0}")]
    AdapterNotFound(String),
    /// Not supported on this host
    #[error("Not supported: {0}")]
    NotSupported(String),
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
    /// Key input source failed
    #[error("Input error: {0}")]
    Input(String),
}

impl ToggleError {
    /// Errors that stop the process instead of being reported and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ToggleError::InvalidCommand(_) | ToggleError::Config(_) | ToggleError::Input(_)
        )
    }

    pub fn provider(adapter: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ToggleError::Provider {
            adapter: adapter.into(),
            reason: err.to_string(),
        }
    }
}

fn exit_code_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" with code {}", c)).unwrap_or_default()
}

pub type ToggleResult<T> = Result<T, ToggleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_display() {
        let err = ToggleError::CommandFailed {
            cmd: "ip link set dev eth0 down".to_string(),
            code: Some(2),
            stderr: "Operation not permitted".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Command 'ip link set dev eth0 down' failed with code 2: Operation not permitted"
        );

        let err = ToggleError::CommandFailed {
            cmd: "ip".to_string(),
            code: None,
            stderr: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "Command 'ip' failed: not found");
    }

    #[test]
    fn test_fatal_classification() {
        assert!(ToggleError::InvalidCommand("3".to_string()).is_fatal());
        assert!(!ToggleError::Validation("abc".to_string()).is_fatal());
        assert!(!ToggleError::provider("eth0", "busy").is_fatal());
    }
}
