//! Input dispatch loop
//!
//! Runs in one of two modes, re-read from the shared settings after every
//! command so a mode switch takes effect without restarting:
//! - GlobalPoll samples every bound key each tick and fires on the debounced
//!   rising edge.
//! - BlockingRead waits for one key press and runs its binding, if any.

use crate::command::{command_for_key, Command, CommandRegistry, Flow, KEY_BINDINGS};
use crate::debounce::KeyDebouncer;
use crate::error::ToggleResult;
use crate::input::InputBackend;
use crate::settings::InputMode;
use crate::status::StatusReporter;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

pub struct InputDispatcher<I: InputBackend> {
    registry: CommandRegistry,
    input: I,
    debouncer: KeyDebouncer<char>,
    poll_interval: Duration,
}

impl<I: InputBackend> InputDispatcher<I> {
    pub fn new(registry: CommandRegistry, input: I, poll_interval: Duration) -> Self {
        Self {
            registry,
            input,
            debouncer: KeyDebouncer::with_keys(KEY_BINDINGS.iter().map(|b| b.key)),
            poll_interval,
        }
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    /// Run until Quit or a fatal error
    pub async fn run(&mut self) -> ToggleResult<()> {
        loop {
            let mode = self.current_mode().await;
            debug!("Dispatching in {} mode", mode);

            let flow = match mode {
                InputMode::GlobalPoll => self.poll_until_switch().await?,
                InputMode::BlockingRead => self.read_one().await?,
            };

            if flow == Flow::Quit {
                info!("Dispatcher stopped");
                return Ok(());
            }
        }
    }

    async fn current_mode(&self) -> InputMode {
        self.registry.controller().settings().read().await.input_mode
    }

    /// Poll ticks until the mode changes or Quit runs
    async fn poll_until_switch(&mut self) -> ToggleResult<Flow> {
        // Keys still held from before polling started must not fire
        self.input.poll_tick()?;
        for binding in KEY_BINDINGS {
            self.debouncer.prime(binding.key, self.input.is_down(binding.key));
        }

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.input.poll_tick()?;

            for binding in KEY_BINDINGS {
                let down = self.input.is_down(binding.key);
                if self.debouncer.sample(binding.key, down) {
                    let flow = self.dispatch(binding.command).await?;
                    if flow == Flow::Quit {
                        return Ok(flow);
                    }
                    if self.current_mode().await != InputMode::GlobalPoll {
                        return Ok(Flow::Continue);
                    }
                }
            }
        }
    }

    /// Wait for one press and run its binding; unbound keys are ignored
    async fn read_one(&mut self) -> ToggleResult<Flow> {
        let key = self.input.next_key().await?;
        match command_for_key(key) {
            Some(command) => self.dispatch(command).await,
            None => {
                debug!("Ignoring unbound key {:?}", key);
                Ok(Flow::Continue)
            }
        }
    }

    /// Run a command; recoverable errors were already reported and do not stop the loop
    async fn dispatch(&mut self, command: Command) -> ToggleResult<Flow> {
        match self.registry.execute(command, &mut self.input).await {
            Ok(flow) => Ok(flow),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                debug!("{} finished with error: {}", command, e);
                Ok(Flow::Continue)
            }
        }
    }
}

/// Ask the operator for the initial input mode ('1' global, '2' local)
pub async fn select_input_mode<I: InputBackend + ?Sized>(
    input: &mut I,
    status: &StatusReporter,
) -> ToggleResult<InputMode> {
    status.warning("Select Input Mode:");
    status.info("1. Global Input");
    status.info("2. Local Input");
    status.warning("Enter Your Choice (1/2): ");

    let choice = input.next_key().await?;
    match InputMode::from_choice(choice) {
        Ok(mode) => {
            status.info(format!("Input mode set to: {}", mode.describe()));
            Ok(mode)
        }
        Err(e) => {
            status.error(e.to_string());
            Err(e)
        }
    }
}
