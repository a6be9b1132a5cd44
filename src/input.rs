//! Key input sources
//!
//! [`InputBackend`] is what the dispatcher reads keys from. [`TerminalInput`]
//! implements it on top of crossterm: held-key sampling for the polling mode,
//! discrete presses for the blocking mode, and line input for prompts.

use crate::error::{ToggleError, ToggleResult};
use async_trait::async_trait;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};
use std::collections::HashMap;
use std::io::{self, BufRead};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Without release reporting a key counts as held this long after its last
/// press or auto-repeat event. Covers the usual 500 ms initial repeat delay.
const HOLD_WINDOW: Duration = Duration::from_millis(550);

/// Source of key input for the dispatcher
#[async_trait]
pub trait InputBackend: Send {
    /// Refresh held-key state; called once per poll tick
    fn poll_tick(&mut self) -> ToggleResult<()>;

    /// Whether `key` (lowercase) is held as of the last tick
    fn is_down(&self, key: char) -> bool;

    /// Wait for the next discrete key press
    async fn next_key(&mut self) -> ToggleResult<char>;

    /// Read one line of text typed by the operator
    async fn read_line(&mut self) -> ToggleResult<String>;
}

/// Map a crossterm key event to the character it represents.
///
/// Ctrl+C maps to 'q' since raw mode swallows the interrupt signal.
pub fn key_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some('q'),
        KeyCode::Char(c) => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

/// Physical key identity, independent of Shift or Ctrl
fn physical_key(key: &KeyEvent) -> KeyCode {
    match key.code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

/// Keys currently held, keyed on the physical key.
///
/// A modifier pressed or released mid-hold changes what the key maps to
/// but not which key it is, so the release always clears the press.
#[derive(Debug, Default)]
pub struct HeldKeys {
    /// Physical key -> (mapped char at press time, last press/repeat)
    keys: HashMap<KeyCode, (char, Instant)>,
}

impl HeldKeys {
    pub fn record(&mut self, key: &KeyEvent, now: Instant) {
        let code = physical_key(key);
        match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                if let Some(c) = key_char(key) {
                    self.keys.insert(code, (c, now));
                }
            }
            KeyEventKind::Release => {
                self.keys.remove(&code);
            }
        }
    }

    /// Drop keys not seen within `window`
    pub fn expire(&mut self, now: Instant, window: Duration) {
        self.keys.retain(|_, (_, seen)| now.duration_since(*seen) < window);
    }

    pub fn is_down(&self, c: char) -> bool {
        self.keys.values().any(|(held, _)| *held == c)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

/// Crossterm-backed terminal input; raw mode lasts as long as this value
pub struct TerminalInput {
    reports_release: bool,
    held: HeldKeys,
}

impl TerminalInput {
    pub fn new() -> ToggleResult<Self> {
        terminal::enable_raw_mode()
            .map_err(|e| ToggleError::Input(format!("Failed to enable raw mode: {}", e)))?;

        let reports_release = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
        if reports_release {
            push_release_reporting()?;
        } else {
            debug!("Terminal does not report key releases, using {:?} hold window", HOLD_WINDOW);
        }

        Ok(Self {
            reports_release,
            held: HeldKeys::default(),
        })
    }

    pub fn reports_release(&self) -> bool {
        self.reports_release
    }
}

fn push_release_reporting() -> ToggleResult<()> {
    let mut stdout = io::stdout();
    execute!(
        stdout,
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .map_err(|e| ToggleError::Input(format!("Failed to enable key release reporting: {}", e)))
}

fn pop_release_reporting() {
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, PopKeyboardEnhancementFlags) {
        warn!("Failed to restore keyboard mode: {}", e);
    }
}

fn input_error(e: impl std::fmt::Display) -> ToggleError {
    ToggleError::Input(e.to_string())
}

#[async_trait]
impl InputBackend for TerminalInput {
    fn poll_tick(&mut self) -> ToggleResult<()> {
        let now = Instant::now();
        while event::poll(Duration::ZERO).map_err(input_error)? {
            if let Event::Key(key) = event::read().map_err(input_error)? {
                self.held.record(&key, now);
            }
        }

        if !self.reports_release {
            self.held.expire(now, HOLD_WINDOW);
        }
        Ok(())
    }

    fn is_down(&self, key: char) -> bool {
        self.held.is_down(key)
    }

    async fn next_key(&mut self) -> ToggleResult<char> {
        // Whatever was held in polling mode is stale now
        self.held.clear();

        tokio::task::spawn_blocking(|| loop {
            if let Event::Key(key) = event::read().map_err(input_error)? {
                // Auto-repeat and release are not new presses
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(c) = key_char(&key) {
                    return Ok(c);
                }
            }
        })
        .await
        .map_err(input_error)?
    }

    async fn read_line(&mut self) -> ToggleResult<String> {
        if self.reports_release {
            pop_release_reporting();
        }
        terminal::disable_raw_mode().map_err(input_error)?;

        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await
        .map_err(input_error)?;

        terminal::enable_raw_mode().map_err(input_error)?;
        if self.reports_release {
            push_release_reporting()?;
        }
        self.held.clear();

        line.map_err(|e| ToggleError::Input(format!("Failed to read from stdin: {}", e)))
    }
}

impl Drop for TerminalInput {
    fn drop(&mut self) {
        if self.reports_release {
            pop_release_reporting();
        }
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("Failed to restore terminal mode: {}", e);
        }
    }
}
