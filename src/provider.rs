//! Network management provider seam
//!
//! The controller never talks to the OS directly; it goes through a
//! [`NetworkProvider`] that can enumerate adapters, query their state and
//! enable or disable them.

use crate::error::ToggleResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One adapter as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterRecord {
    /// Stable identifier used for queries and actions
    pub id: String,
    /// Display name
    pub name: String,
}

impl AdapterRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Adapter link state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdapterState {
    /// Administratively up, no carrier
    Enabled,
    /// Administratively down
    Disabled,
    /// Up with carrier
    Connected,
    /// Reachable by the provider but without link
    Disconnected,
    /// State could not be determined
    Unknown,
}

impl AdapterState {
    /// States a bulk disable acts on
    pub fn wants_disable(self) -> bool {
        matches!(self, AdapterState::Enabled | AdapterState::Connected)
    }

    /// States a bulk enable acts on
    pub fn wants_enable(self) -> bool {
        matches!(self, AdapterState::Disabled | AdapterState::Disconnected)
    }
}

impl fmt::Display for AdapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdapterState::Enabled => "Enabled",
            AdapterState::Disabled => "Disabled",
            AdapterState::Connected => "Connected",
            AdapterState::Disconnected => "Disconnected",
            AdapterState::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Adapter enumeration and control backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NetworkProvider: Send + Sync {
    /// List every adapter currently present
    async fn list_adapters(&self) -> ToggleResult<Vec<AdapterRecord>>;

    /// Query the current state of one adapter
    async fn get_state(&self, id: &str) -> ToggleResult<AdapterState>;

    /// Enable (bring up) one adapter
    async fn enable(&self, id: &str) -> ToggleResult<()>;

    /// Disable (bring down) one adapter
    async fn disable(&self, id: &str) -> ToggleResult<()>;
}
