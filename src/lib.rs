//! nettoggle - Network Adapter Switch Library
//!
//! Toggles the enabled state of every network adapter on the host, either
//! immediately or for a bounded duration with automatic re-enable, driven by
//! single-key commands:
//! - Interface toggle controller (bulk enable/disable, timed disable)
//! - Network management provider (sysfs + `ip` on Linux)
//! - Key debouncing and input dispatch (polling or blocking read)
//! - Command registry shared by both input modes

pub mod error;
pub mod validation;
pub mod config;
pub mod settings;
pub mod status;
pub mod provider;
pub mod interface;
pub mod session;
pub mod controller;
pub mod debounce;
pub mod command;
pub mod input;
pub mod dispatcher;

// Re-export commonly used types
pub use error::{ToggleError, ToggleResult};
pub use config::ToggleConfig;
pub use settings::{InputMode, LogLevel, Settings, SharedSettings};
pub use status::{Severity, StatusEvent, StatusMessage, StatusReporter};
pub use provider::{AdapterRecord, AdapterState, NetworkProvider};
pub use interface::LinuxProvider;
pub use session::SessionInfo;
pub use controller::{BatchReport, InterfaceToggleController, TimedDisable};
pub use debounce::KeyDebouncer;
pub use command::{Command, CommandRegistry, Flow, KeyBinding, KEY_BINDINGS};
pub use input::{InputBackend, TerminalInput};
pub use dispatcher::{select_input_mode, InputDispatcher};
