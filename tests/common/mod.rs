//! Shared fixtures: an in-memory provider and a scripted key source

#![allow(dead_code)]

use async_trait::async_trait;
use libnettoggle::*;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Provider backed by a map of adapter states
pub struct FakeProvider {
    states: Mutex<BTreeMap<String, AdapterState>>,
    actions: AtomicUsize,
    failing: HashSet<String>,
    listing_fails: AtomicBool,
}

impl FakeProvider {
    pub fn new(adapters: &[(&str, AdapterState)]) -> Self {
        Self {
            states: Mutex::new(
                adapters
                    .iter()
                    .map(|(id, state)| (id.to_string(), *state))
                    .collect(),
            ),
            actions: AtomicUsize::new(0),
            failing: HashSet::new(),
            listing_fails: AtomicBool::new(false),
        }
    }

    /// Every enable/disable on `id` fails
    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    /// Hot-plug an adapter
    pub fn insert(&self, id: &str, state: AdapterState) {
        self.states.lock().unwrap().insert(id.to_string(), state);
    }

    /// Unplug an adapter
    pub fn remove(&self, id: &str) {
        self.states.lock().unwrap().remove(id);
    }

    /// Make enumeration fail until reset
    pub fn set_listing_fails(&self, fails: bool) {
        self.listing_fails.store(fails, Ordering::SeqCst);
    }

    pub fn state(&self, id: &str) -> AdapterState {
        self.states.lock().unwrap()[id]
    }

    pub fn states(&self) -> Vec<AdapterState> {
        self.states.lock().unwrap().values().copied().collect()
    }

    /// Enable/disable calls issued so far
    pub fn actions(&self) -> usize {
        self.actions.load(Ordering::SeqCst)
    }

    fn set(&self, id: &str, state: AdapterState) -> ToggleResult<()> {
        self.actions.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(id) {
            return Err(ToggleError::provider(id, "device busy"));
        }
        match self.states.lock().unwrap().get_mut(id) {
            Some(current) => {
                *current = state;
                Ok(())
            }
            None => Err(ToggleError::AdapterNotFound(id.to_string())),
        }
    }
}

#[async_trait]
impl NetworkProvider for FakeProvider {
    async fn list_adapters(&self) -> ToggleResult<Vec<AdapterRecord>> {
        if self.listing_fails.load(Ordering::SeqCst) {
            return Err(ToggleError::NotSupported("enumeration unavailable".into()));
        }
        Ok(self
            .states
            .lock()
            .unwrap()
            .keys()
            .map(|id| AdapterRecord::new(id.clone(), id.clone()))
            .collect())
    }

    async fn get_state(&self, id: &str) -> ToggleResult<AdapterState> {
        self.states
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .ok_or_else(|| ToggleError::AdapterNotFound(id.to_string()))
    }

    async fn enable(&self, id: &str) -> ToggleResult<()> {
        self.set(id, AdapterState::Enabled)
    }

    async fn disable(&self, id: &str) -> ToggleResult<()> {
        self.set(id, AdapterState::Disabled)
    }
}

/// Input backend that replays a fixed script.
///
/// Running out of script is an input error, which stops the dispatcher.
#[derive(Default)]
pub struct ScriptedInput {
    frames: VecDeque<HashSet<char>>,
    current: HashSet<char>,
    keys: VecDeque<char>,
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// One poll tick per entry; each string lists the keys held during it
    pub fn frames(mut self, frames: &[&str]) -> Self {
        self.frames = frames.iter().map(|f| f.chars().collect()).collect();
        self
    }

    pub fn keys(mut self, keys: &str) -> Self {
        self.keys = keys.chars().collect();
        self
    }

    pub fn lines(mut self, lines: &[&str]) -> Self {
        self.lines = lines.iter().map(|l| format!("{}\n", l)).collect();
        self
    }

    pub fn frames_left(&self) -> usize {
        self.frames.len()
    }

    pub fn keys_left(&self) -> usize {
        self.keys.len()
    }
}

#[async_trait]
impl InputBackend for ScriptedInput {
    fn poll_tick(&mut self) -> ToggleResult<()> {
        self.current = self
            .frames
            .pop_front()
            .ok_or_else(|| ToggleError::Input("poll script exhausted".into()))?;
        Ok(())
    }

    fn is_down(&self, key: char) -> bool {
        self.current.contains(&key)
    }

    async fn next_key(&mut self) -> ToggleResult<char> {
        self.keys
            .pop_front()
            .ok_or_else(|| ToggleError::Input("key script exhausted".into()))
    }

    async fn read_line(&mut self) -> ToggleResult<String> {
        self.lines
            .pop_front()
            .ok_or_else(|| ToggleError::Input("line script exhausted".into()))
    }
}

pub struct Harness {
    pub provider: Arc<FakeProvider>,
    pub controller: Arc<InterfaceToggleController>,
    pub rx: mpsc::UnboundedReceiver<StatusMessage>,
}

impl Harness {
    pub fn new(provider: FakeProvider, mode: InputMode) -> Self {
        let provider = Arc::new(provider);
        let (status, rx) = StatusReporter::channel();
        let settings = Settings::new(mode).shared();
        let controller = Arc::new(InterfaceToggleController::new(
            provider.clone(),
            settings,
            status,
        ));
        Self {
            provider,
            controller,
            rx,
        }
    }

    pub fn registry(&self) -> CommandRegistry {
        CommandRegistry::new(self.controller.clone())
    }

    pub fn dispatcher(&self, input: ScriptedInput) -> InputDispatcher<ScriptedInput> {
        InputDispatcher::new(self.registry(), input, POLL_INTERVAL)
    }

    /// Status events emitted since the last drain
    pub fn events(&mut self) -> Vec<(Severity, String)> {
        let mut events = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            if let StatusMessage::Event(e) = msg {
                events.push((e.severity, e.message));
            }
        }
        events
    }

    pub async fn mode(&self) -> InputMode {
        self.controller.settings().read().await.input_mode
    }

    pub async fn log_level(&self) -> LogLevel {
        self.controller.settings().read().await.log_level
    }

    pub async fn duration(&self) -> Option<u64> {
        self.controller.settings().read().await.disable_duration_secs
    }
}

pub fn count(events: &[(Severity, String)], message: &str) -> usize {
    events.iter().filter(|(_, m)| m == message).count()
}
