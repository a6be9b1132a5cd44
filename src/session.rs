//! Timed-disable session bookkeeping
//!
//! At most one session is pending at a time. Starting a new one supersedes
//! the previous session: its cancellation channel fires and its generation
//! id no longer matches, so the old re-enable task can never run.

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::oneshot;

/// Public view of a pending session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub id: u64,
    pub duration_secs: u64,
    pub started_at: DateTime<Local>,
}

#[derive(Debug)]
struct DisableSession {
    info: SessionInfo,
    cancel: oneshot::Sender<()>,
}

/// Holder for the single pending session
#[derive(Debug, Default)]
pub struct SessionSlot {
    next_id: u64,
    current: Option<DisableSession>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session, cancelling any pending one.
    ///
    /// Returns the new session's info, the receiver its re-enable task
    /// waits on, and the superseded session if there was one.
    pub fn begin(
        &mut self,
        duration_secs: u64,
    ) -> (SessionInfo, oneshot::Receiver<()>, Option<SessionInfo>) {
        let superseded = self.cancel();

        self.next_id += 1;
        let (cancel, cancel_rx) = oneshot::channel();
        let info = SessionInfo {
            id: self.next_id,
            duration_secs,
            started_at: Local::now(),
        };
        self.current = Some(DisableSession {
            info: info.clone(),
            cancel,
        });

        (info, cancel_rx, superseded)
    }

    /// Claim the right to fire the re-enable for session `id`.
    ///
    /// Returns true once for the current session; false if it was
    /// superseded, cancelled or already finished.
    pub fn finish(&mut self, id: u64) -> bool {
        match &self.current {
            Some(session) if session.info.id == id => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    /// Cancel the pending session, if any
    pub fn cancel(&mut self) -> Option<SessionInfo> {
        let session = self.current.take()?;
        // Receiver already gone means the task has finished waiting
        let _ = session.cancel.send(());
        Some(session.info)
    }

    pub fn pending(&self) -> Option<&SessionInfo> {
        self.current.as_ref().map(|s| &s.info)
    }
}
