//! Interface toggle controller
//!
//! Owns the cached adapter list, applies bulk enable/disable by comparing
//! each adapter's current state against the desired one, and runs the
//! timed disable session with its deferred re-enable.

use crate::error::ToggleResult;
use crate::provider::{AdapterRecord, AdapterState, NetworkProvider};
use crate::session::{SessionInfo, SessionSlot};
use crate::settings::SharedSettings;
use crate::status::StatusReporter;
use crate::validation;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

/// Range for a timed disable with no explicit duration
pub const RANDOM_DURATION_RANGE: std::ops::RangeInclusive<u64> = 5..=10;

/// Direction of a bulk operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Enable,
    Disable,
}

impl Transition {
    fn applies_to(self, state: AdapterState) -> bool {
        match self {
            Transition::Enable => state.wants_enable(),
            Transition::Disable => state.wants_disable(),
        }
    }

    fn reached(self, state: AdapterState) -> bool {
        match self {
            Transition::Enable => {
                matches!(state, AdapterState::Enabled | AdapterState::Connected)
            }
            Transition::Disable => {
                matches!(state, AdapterState::Disabled | AdapterState::Disconnected)
            }
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Transition::Enable => "enable",
            Transition::Disable => "disable",
        }
    }

    fn gerund(self) -> &'static str {
        match self {
            Transition::Enable => "Enabling",
            Transition::Disable => "Disabling",
        }
    }

    fn already(self) -> &'static str {
        match self {
            Transition::Enable => "already enabled or connected",
            Transition::Disable => "already disabled",
        }
    }
}

/// Outcome of one bulk operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Adapters an action was issued for and that reached the target state
    pub changed: Vec<String>,
    /// Adapters left alone
    pub unchanged: Vec<String>,
    /// Adapters whose query or action failed
    pub failed: Vec<String>,
}

impl BatchReport {
    /// Number of enable/disable actions issued
    pub fn actions(&self) -> usize {
        self.changed.len() + self.failed.len()
    }
}

/// A scheduled re-enable
#[derive(Debug)]
pub struct TimedDisable {
    pub session: SessionInfo,
    /// Completes after the re-enable ran or the session was cancelled
    pub handle: JoinHandle<()>,
}

/// Bulk adapter controller
pub struct InterfaceToggleController {
    provider: Arc<dyn NetworkProvider>,
    settings: SharedSettings,
    status: StatusReporter,
    /// Held for the whole of a refresh-and-apply batch
    adapters: Mutex<Vec<AdapterRecord>>,
    sessions: Mutex<SessionSlot>,
    excluded: Vec<String>,
    verify_transitions: bool,
}

impl InterfaceToggleController {
    pub fn new(
        provider: Arc<dyn NetworkProvider>,
        settings: SharedSettings,
        status: StatusReporter,
    ) -> Self {
        Self {
            provider,
            settings,
            status,
            adapters: Mutex::new(Vec::new()),
            sessions: Mutex::new(SessionSlot::new()),
            excluded: Vec::new(),
            verify_transitions: true,
        }
    }

    /// Adapters never touched by bulk operations
    pub fn with_excluded(mut self, excluded: Vec<String>) -> Self {
        self.excluded = excluded;
        self
    }

    /// Re-read the state after each action and warn if it did not stick
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_transitions = verify;
        self
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    /// Snapshot of the adapters found by the last refresh
    pub async fn adapters(&self) -> Vec<AdapterRecord> {
        self.adapters.lock().await.clone()
    }

    /// Re-enumerate adapters, replacing the cached set
    pub async fn refresh(&self) -> ToggleResult<Vec<AdapterRecord>> {
        let mut cache = self.adapters.lock().await;
        self.refresh_locked(&mut cache).await?;
        Ok(cache.clone())
    }

    /// Query every adapter's current state
    pub async fn states(&self) -> ToggleResult<Vec<(AdapterRecord, AdapterState)>> {
        let adapters = self.refresh().await?;
        let mut states = Vec::with_capacity(adapters.len());
        for adapter in adapters {
            let state = self.query_state(&adapter).await;
            states.push((adapter, state));
        }
        Ok(states)
    }

    pub async fn disable_all(&self) -> ToggleResult<BatchReport> {
        self.apply_all(Transition::Disable).await
    }

    pub async fn enable_all(&self) -> ToggleResult<BatchReport> {
        self.apply_all(Transition::Enable).await
    }

    /// Disable everything now and re-enable after `duration_secs`.
    ///
    /// With no duration a random one in 5-10 seconds is drawn. The chosen
    /// duration becomes the default for later runs. A session still
    /// pending is superseded.
    pub async fn run_timed_disable(
        self: &Arc<Self>,
        duration_secs: Option<u64>,
    ) -> ToggleResult<TimedDisable> {
        let seconds = match duration_secs {
            Some(seconds) => validation::validate_disable_duration(seconds)?,
            None => random_duration(),
        };
        self.settings.write().await.disable_duration_secs = Some(seconds);

        // Supersede first so a pending re-enable cannot fire between the
        // disable below and the new timer
        let (session, cancel_rx, superseded) = self.sessions.lock().await.begin(seconds);
        if let Some(previous) = superseded {
            self.status.info(format!(
                "Previous timed disable ({} seconds) superseded.",
                previous.duration_secs
            ));
        }

        // Per-adapter failures are already reported; re-enable is scheduled regardless
        match self.disable_all().await {
            Ok(_) => self
                .status
                .warning(format!("Network interfaces disabled for {} seconds.", seconds)),
            Err(e) => {
                debug!("Timed disable continuing after batch error: {}", e);
                self.status.warning(format!(
                    "Interfaces could not be disabled; re-enable still runs in {} seconds.",
                    seconds
                ));
            }
        }

        let controller = Arc::clone(self);
        let id = session.id;
        let handle = tokio::spawn(async move {
            controller
                .reenable_after(id, Duration::from_secs(seconds), cancel_rx)
                .await;
        });

        Ok(TimedDisable { session, handle })
    }

    /// Drop the pending re-enable; adapters stay as they are
    pub async fn cancel_timed_disable(&self) -> Option<SessionInfo> {
        let cancelled = self.sessions.lock().await.cancel();
        match &cancelled {
            Some(info) => self.status.info(format!(
                "Pending re-enable cancelled ({} second session).",
                info.duration_secs
            )),
            None => self.status.notice("No timed disable is pending."),
        }
        cancelled
    }

    pub async fn pending_session(&self) -> Option<SessionInfo> {
        self.sessions.lock().await.pending().cloned()
    }

    /// Store the default duration for timed disables (minimum 5 seconds)
    pub async fn set_disable_duration(&self, seconds: u64) -> ToggleResult<u64> {
        let result = self.settings.write().await.set_disable_duration(seconds);
        self.report_duration_result(&result).await;
        result
    }

    /// Parse operator input and store it as the default duration
    pub async fn set_disable_duration_from_input(&self, input: &str) -> ToggleResult<u64> {
        let result = match validation::parse_disable_duration(input) {
            Ok(seconds) => self.settings.write().await.set_disable_duration(seconds),
            Err(e) => Err(e),
        };
        self.report_duration_result(&result).await;
        result
    }

    async fn report_duration_result(&self, result: &ToggleResult<u64>) {
        match result {
            Ok(seconds) => self.status.info(format!(
                "Network will be disabled for {} seconds when triggered.",
                seconds
            )),
            Err(e) => {
                let current = match self.settings.read().await.disable_duration_secs {
                    Some(s) => format!("{} seconds", s),
                    None => "random 5-10 seconds".to_string(),
                };
                self.status.error(format!("{}. Duration unchanged ({}).", e, current));
            }
        }
    }

    async fn reenable_after(
        &self,
        id: u64,
        delay: Duration,
        cancel_rx: oneshot::Receiver<()>,
    ) {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel_rx => {
                debug!("Timed disable session {} cancelled", id);
                return;
            }
        }

        if !self.sessions.lock().await.finish(id) {
            debug!("Timed disable session {} no longer current", id);
            return;
        }

        match self.enable_all().await {
            Ok(report) if report.failed.is_empty() => {
                self.status.success("Network interfaces re-enabled.");
            }
            Ok(report) => {
                self.status.warning(format!(
                    "Network re-enable finished with {} failure(s).",
                    report.failed.len()
                ));
            }
            Err(e) => {
                self.status.error(format!("Network re-enable failed: {}", e));
            }
        }
        self.status.instructions();
    }

    async fn apply_all(&self, transition: Transition) -> ToggleResult<BatchReport> {
        let mut cache = self.adapters.lock().await;
        self.refresh_locked(&mut cache).await?;
        let detailed = self.settings.read().await.is_detailed();

        let mut report = BatchReport::default();
        for adapter in cache.iter() {
            let state = match self.provider.get_state(&adapter.id).await {
                Ok(state) => state,
                Err(e) => {
                    self.status.error(format!(
                        "Error retrieving state for interface '{}': {}",
                        adapter.name, e
                    ));
                    report.failed.push(adapter.id.clone());
                    continue;
                }
            };

            if transition.applies_to(state) {
                if self.transition(adapter, transition, detailed).await {
                    report.changed.push(adapter.id.clone());
                } else {
                    report.failed.push(adapter.id.clone());
                }
            } else {
                if detailed {
                    let message = if state == AdapterState::Unknown {
                        format!("NetInterface | '{}' state unknown, skipped.", adapter.name)
                    } else {
                        format!("NetInterface | '{}' {}.", adapter.name, transition.already())
                    };
                    self.status.notice(message);
                }
                report.unchanged.push(adapter.id.clone());
            }
        }

        debug!(
            "{} batch: {} changed, {} unchanged, {} failed",
            transition.verb(),
            report.changed.len(),
            report.unchanged.len(),
            report.failed.len()
        );
        self.status.instructions();
        Ok(report)
    }

    /// Issue one action; true if it succeeded (and verified, when enabled)
    async fn transition(
        &self,
        adapter: &AdapterRecord,
        transition: Transition,
        detailed: bool,
    ) -> bool {
        if detailed {
            self.status.info(format!(
                "{} interface with DeviceID '{}'...",
                transition.gerund(),
                adapter.id
            ));
        }

        let result = match transition {
            Transition::Enable => self.provider.enable(&adapter.id).await,
            Transition::Disable => self.provider.disable(&adapter.id).await,
        };

        if let Err(e) = result {
            self.status.error(format!(
                "Error {} interface '{}': {}",
                transition.gerund().to_lowercase(),
                adapter.name,
                e
            ));
            return false;
        }

        if !self.verify_transitions {
            self.status.success(format!(
                "Successfully {}d interface '{}'.",
                transition.verb(),
                adapter.name
            ));
            return true;
        }

        match self.provider.get_state(&adapter.id).await {
            Ok(state) if transition.reached(state) => {
                self.status
                    .success(format!("Interface '{}' {}d.", adapter.name, transition.verb()));
                true
            }
            Ok(state) => {
                self.status.warning(format!(
                    "Failed to {} '{}'. Current state: {}",
                    transition.verb(),
                    adapter.name,
                    state
                ));
                false
            }
            Err(e) => {
                // Action itself succeeded
                self.status.warning(format!(
                    "{} command issued for '{}' but state could not be verified: {}",
                    transition.gerund(),
                    adapter.name,
                    e
                ));
                true
            }
        }
    }

    async fn refresh_locked(&self, cache: &mut Vec<AdapterRecord>) -> ToggleResult<()> {
        let listed = match self.provider.list_adapters().await {
            Ok(adapters) => adapters,
            Err(e) => {
                self.status.error(format!("Failed to enumerate network interfaces: {}", e));
                return Err(e);
            }
        };

        let (kept, skipped): (Vec<_>, Vec<_>) = listed
            .into_iter()
            .partition(|a| !self.excluded.iter().any(|x| x == &a.id));
        for adapter in &skipped {
            debug!("Skipping excluded interface {}", adapter.id);
        }
        *cache = kept;

        if cache.is_empty() {
            self.status.warning("No network interfaces found.");
            return Ok(());
        }

        if self.settings.read().await.is_detailed() {
            self.report_states(cache).await;
        }
        Ok(())
    }

    /// Detailed-mode table of adapters grouped by state
    async fn report_states(&self, adapters: &[AdapterRecord]) {
        let mut groups: Vec<(AdapterState, Vec<&AdapterRecord>)> = Vec::new();
        for adapter in adapters {
            let state = self.query_state(adapter).await;
            match groups.iter_mut().find(|(s, _)| *s == state) {
                Some((_, members)) => members.push(adapter),
                None => groups.push((state, vec![adapter])),
            }
        }

        self.status.info(" Network Interface | Status");
        self.status.info(" ------------------|-------");
        for (state, members) in groups {
            for adapter in members {
                self.status.notice(format!("{} | {}", adapter.name, state));
            }
        }
    }

    async fn query_state(&self, adapter: &AdapterRecord) -> AdapterState {
        match self.provider.get_state(&adapter.id).await {
            Ok(state) => state,
            Err(e) => {
                self.status.error(format!(
                    "Error retrieving state for interface '{}': {}",
                    adapter.id, e
                ));
                AdapterState::Unknown
            }
        }
    }
}

/// Draw a duration for a timed disable with none configured
pub fn random_duration() -> u64 {
    rand::thread_rng().gen_range(RANDOM_DURATION_RANGE)
}
