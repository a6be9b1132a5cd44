//! Status notifications
//!
//! Every controller and dispatcher action reports what happened as a
//! [`StatusEvent`]. Events are mirrored to `tracing` and pushed to the
//! presentation layer over an unbounded channel; rendering is not done here.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Severity / category of a status event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Detail notices ("already disabled")
    Notice,
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Notice => "notice",
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusEvent {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

impl StatusEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            severity,
            message: message.into(),
        }
    }
}

/// What the presentation layer receives
#[derive(Debug, Clone)]
pub enum StatusMessage {
    Event(StatusEvent),
    /// Key bindings should be shown again
    Instructions,
    /// Screen should be wiped, then instructions shown
    ClearScreen,
}

/// Emits status events; cheap to clone
#[derive(Debug, Clone)]
pub struct StatusReporter {
    tx: Option<mpsc::UnboundedSender<StatusMessage>>,
}

impl StatusReporter {
    /// Create a reporter and the receiving end for the presentation layer
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StatusMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Reporter that only writes to tracing
    pub fn tracing_only() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, severity: Severity, message: impl Into<String>) {
        let event = StatusEvent::new(severity, message);

        match severity {
            Severity::Notice => debug!("{}", event.message),
            Severity::Info | Severity::Success => info!("{}", event.message),
            Severity::Warning => warn!("{}", event.message),
            Severity::Error => error!("{}", event.message),
        }

        self.send(StatusMessage::Event(event));
    }

    pub fn notice(&self, message: impl Into<String>) {
        self.emit(Severity::Notice, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(Severity::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.emit(Severity::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.emit(Severity::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(Severity::Error, message);
    }

    pub fn instructions(&self) {
        self.send(StatusMessage::Instructions);
    }

    pub fn clear_screen(&self) {
        self.send(StatusMessage::ClearScreen);
    }

    fn send(&self, message: StatusMessage) {
        if let Some(tx) = &self.tx {
            // Receiver gone means the presentation layer has shut down
            if tx.send(message).is_err() {
                debug!("Status receiver closed, dropping message");
            }
        }
    }
}
