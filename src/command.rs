//! Commands, key bindings and the registry that runs them
//!
//! Both input modes resolve keys through the same [`KEY_BINDINGS`] table and
//! execute through the same [`CommandRegistry`], so a key does the same thing
//! whichever way it was read.

use crate::controller::InterfaceToggleController;
use crate::error::ToggleResult;
use crate::input::InputBackend;
use crate::validation;
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;

/// Every operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Disable,
    Enable,
    ToggleLogLevel,
    Quit,
    ToggleInputMode,
    SetDuration,
    RunTimedDisable,
    ClearScreen,
}

impl Command {
    pub fn description(self) -> &'static str {
        match self {
            Command::Disable => "disable all network interfaces",
            Command::Enable => "enable all network interfaces",
            Command::ToggleLogLevel => "toggle logging level",
            Command::Quit => "quit",
            Command::ToggleInputMode => "toggle input mode between Global and Local inputs",
            Command::SetDuration => "set temporary disable duration",
            Command::RunTimedDisable => "temporarily disable the network for the set duration",
            Command::ClearScreen => "clear console output",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A key and the command it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    /// Lowercase key character
    pub key: char,
    pub command: Command,
}

/// The one binding table used by both input modes
pub const KEY_BINDINGS: &[KeyBinding] = &[
    KeyBinding { key: 'd', command: Command::Disable },
    KeyBinding { key: 'e', command: Command::Enable },
    KeyBinding { key: 'l', command: Command::ToggleLogLevel },
    KeyBinding { key: 'q', command: Command::Quit },
    KeyBinding { key: 't', command: Command::ToggleInputMode },
    KeyBinding { key: 's', command: Command::SetDuration },
    KeyBinding { key: 'r', command: Command::RunTimedDisable },
    KeyBinding { key: 'c', command: Command::ClearScreen },
];

/// Look up a key, ignoring case
pub fn command_for_key(key: char) -> Option<Command> {
    let key = key.to_ascii_lowercase();
    KEY_BINDINGS
        .iter()
        .find(|binding| binding.key == key)
        .map(|binding| binding.command)
}

/// Operator instructions, one line per binding
pub fn instructions() -> Vec<String> {
    KEY_BINDINGS
        .iter()
        .map(|b| format!("Press '{}' to {}.", b.key.to_ascii_uppercase(), b.command.description()))
        .collect()
}

/// What the dispatch loop does after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Executes commands against the controller and shared settings
#[derive(Clone)]
pub struct CommandRegistry {
    controller: Arc<InterfaceToggleController>,
}

impl CommandRegistry {
    pub fn new(controller: Arc<InterfaceToggleController>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &Arc<InterfaceToggleController> {
        &self.controller
    }

    /// Run one command. `input` is only used by commands that prompt.
    pub async fn execute<I>(&self, command: Command, input: &mut I) -> ToggleResult<Flow>
    where
        I: InputBackend + ?Sized,
    {
        debug!("Executing command {}", command);
        let status = self.controller.status();

        match command {
            Command::Disable => {
                self.controller.disable_all().await?;
            }
            Command::Enable => {
                self.controller.enable_all().await?;
            }
            Command::ToggleLogLevel => {
                let level = self.controller.settings().write().await.toggle_log_level();
                status.info(format!("Logging level set to {}", level));
            }
            Command::Quit => {
                status.warning("Exiting...");
                return Ok(Flow::Quit);
            }
            Command::ToggleInputMode => {
                let toggled = self
                    .controller
                    .settings()
                    .write()
                    .await
                    .toggle_input_mode(Instant::now());
                match toggled {
                    Some(mode) => {
                        status.warning("Toggling Input Mode...");
                        status.info(format!("Input mode set to: {}", mode.describe()));
                    }
                    None => status.notice("Input mode toggle ignored (cooldown)."),
                }
            }
            Command::SetDuration => {
                status.info(format!(
                    "Enter seconds to temporarily disable the network (min {} seconds): ",
                    validation::MIN_DISABLE_DURATION_SECS
                ));
                let line = match input.read_line().await {
                    Ok(line) => line,
                    Err(e) => {
                        status.error(format!("Failed to read duration: {}", e));
                        return Err(e);
                    }
                };
                // Rejected input is reported by the controller and leaves the default alone
                let _ = self.controller.set_disable_duration_from_input(&line).await;
            }
            Command::RunTimedDisable => {
                let duration = self.controller.settings().read().await.disable_duration_secs;
                self.controller.run_timed_disable(duration).await?;
            }
            Command::ClearScreen => {
                status.clear_screen();
            }
        }

        Ok(Flow::Continue)
    }
}
