//! nettoggle - Network Adapter Switch
//!
//! Interactive single-key switch for every network adapter on the host.
//!
//! # Usage
//!
//! ```bash
//! # Interactive, prompts for the input mode (requires root/sudo)
//! sudo nettoggle
//!
//! # Interactive, blocking key reads, 8 second timed disable
//! sudo nettoggle --mode local --duration 8
//!
//! # One-shot commands
//! nettoggle status --json
//! sudo nettoggle disable
//! sudo nettoggle pulse 10
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use crossterm::{cursor, execute, terminal};
use libnettoggle::command::instructions;
use libnettoggle::config::{default_config_path, ToggleConfig};
use libnettoggle::controller::Transition;
use libnettoggle::*;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Network adapter switch
#[derive(Parser, Debug)]
#[command(name = "nettoggle")]
#[command(version)]
#[command(
    about = "Network adapter switch - disable and re-enable every interface with one key",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input mode: global (key polling) or local (blocking key reads)
    #[arg(short, long)]
    mode: Option<InputMode>,

    /// Status verbosity: minimal or detailed
    #[arg(short, long, value_parser = parse_log_level)]
    log_level: Option<LogLevel>,

    /// Default timed-disable duration in seconds (min 5)
    #[arg(short, long, value_parser = parse_duration)]
    duration: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive key-driven switch (default)
    Run,
    /// List adapters and their state
    Status {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Disable every adapter
    Disable,
    /// Enable every adapter
    Enable,
    /// Disable every adapter, wait, then re-enable
    Pulse {
        /// Seconds to stay disabled (random 5-10 when omitted)
        seconds: Option<u64>,
    },
}

fn parse_log_level(s: &str) -> std::result::Result<LogLevel, String> {
    match s.to_ascii_lowercase().as_str() {
        "minimal" => Ok(LogLevel::Minimal),
        "detailed" => Ok(LogLevel::Detailed),
        other => Err(format!("unknown log level '{}' (expected minimal or detailed)", other)),
    }
}

fn parse_duration(s: &str) -> std::result::Result<u64, String> {
    validation::parse_disable_duration(s).map_err(|e| e.to_string())
}

#[derive(Serialize)]
struct AdapterStatus {
    id: String,
    name: String,
    state: AdapterState,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = load_config(&cli)?;

    #[cfg(target_os = "linux")]
    {
        let uid = unsafe { libc::geteuid() };
        if uid != 0 && !matches!(cli.command, Some(Commands::Status { .. })) {
            warn!("Not running as root - enabling or disabling interfaces will likely fail");
        }
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_interactive(&config).await,
        Commands::Status { json } => show_status(&config, json).await,
        Commands::Disable => run_once(&config, Transition::Disable).await,
        Commands::Enable => run_once(&config, Transition::Enable).await,
        Commands::Pulse { seconds } => run_pulse(&config, seconds).await,
    }
}

/// Initialize logging; the status stream is the operator view, so default to warnings
fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "warn" };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("nettoggle={},libnettoggle={}", log_level, log_level))
    });

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .init();
}

fn load_config(cli: &Cli) -> Result<ToggleConfig> {
    let mut config = match &cli.config {
        Some(path) => ToggleConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ToggleConfig::load_or_default(default_config_path())
            .context("loading default configuration")?,
    };

    if let Some(mode) = cli.mode {
        config.input_mode = Some(mode);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(seconds) = cli.duration {
        config.disable_duration_secs = Some(seconds);
    }
    Ok(config)
}

fn build_controller(
    config: &ToggleConfig,
    status: StatusReporter,
    input_mode: InputMode,
) -> Arc<InterfaceToggleController> {
    let settings = Settings::from_config(config, input_mode).shared();
    Arc::new(
        InterfaceToggleController::new(Arc::new(LinuxProvider::new()), settings, status)
            .with_excluded(config.excluded_interfaces.clone())
            .with_verification(config.verify_transitions),
    )
}

async fn run_interactive(config: &ToggleConfig) -> Result<()> {
    let (status, rx) = StatusReporter::channel();
    let renderer = Renderer::spawn(rx);

    let result = interactive_loop(config, status).await;

    renderer.finish().await;
    result.map_err(Into::into)
}

async fn interactive_loop(config: &ToggleConfig, status: StatusReporter) -> ToggleResult<()> {
    let mut input = TerminalInput::new()?;

    let mode = match config.input_mode {
        Some(mode) => mode,
        None => select_input_mode(&mut input, &status).await?,
    };

    let controller = build_controller(config, status.clone(), mode);
    info!("Starting nettoggle in {} input mode", mode);
    status.clear_screen();

    let registry = CommandRegistry::new(controller);
    let mut dispatcher = InputDispatcher::new(registry, input, config.poll_interval());
    dispatcher.run().await
}

async fn show_status(config: &ToggleConfig, json: bool) -> Result<()> {
    let mut config = config.clone();
    config.log_level = LogLevel::Minimal;
    let controller =
        build_controller(&config, StatusReporter::tracing_only(), InputMode::BlockingRead);

    let states = controller.states().await?;
    if json {
        let rows: Vec<AdapterStatus> = states
            .into_iter()
            .map(|(adapter, state)| AdapterStatus {
                id: adapter.id,
                name: adapter.name,
                state,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{:<24} {}", "INTERFACE", "STATE");
        for (adapter, state) in states {
            println!("{:<24} {}", adapter.name, state);
        }
    }
    Ok(())
}

async fn run_once(config: &ToggleConfig, transition: Transition) -> Result<()> {
    let (status, rx) = StatusReporter::channel();
    let renderer = Renderer::spawn(rx).quiet_instructions();
    let controller = build_controller(config, status, InputMode::BlockingRead);

    let result = match transition {
        Transition::Enable => controller.enable_all().await,
        Transition::Disable => controller.disable_all().await,
    };
    drop(controller);
    renderer.finish().await;

    let report = result?;
    if !report.failed.is_empty() {
        bail!("{} interface(s) failed: {}", report.failed.len(), report.failed.join(", "));
    }
    Ok(())
}

async fn run_pulse(config: &ToggleConfig, seconds: Option<u64>) -> Result<()> {
    let (status, rx) = StatusReporter::channel();
    let renderer = Renderer::spawn(rx).quiet_instructions();
    let controller = build_controller(config, status, InputMode::BlockingRead);

    let timed = controller.run_timed_disable(seconds).await?;
    let mut handle = timed.handle;

    tokio::select! {
        joined = &mut handle => {
            joined.context("re-enable task failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            // Do not leave the host offline
            warn!("Interrupted, re-enabling interfaces now");
            controller.cancel_timed_disable().await;
            controller.enable_all().await?;
        }
    }

    drop(controller);
    renderer.finish().await;
    Ok(())
}

/// Presentation layer: prints status messages to the terminal
struct Renderer {
    handle: JoinHandle<()>,
    shutdown: oneshot::Sender<()>,
    show_instructions: Arc<std::sync::atomic::AtomicBool>,
}

impl Renderer {
    fn spawn(mut rx: mpsc::UnboundedReceiver<StatusMessage>) -> Self {
        let (shutdown, mut shutdown_rx) = oneshot::channel();
        let show_instructions = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let show = show_instructions.clone();
        let color = atty::is(atty::Stream::Stdout);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    msg = rx.recv() => match msg {
                        Some(msg) => render(msg, color, &show),
                        None => break,
                    },
                    _ = &mut shutdown_rx => {
                        while let Ok(msg) = rx.try_recv() {
                            render(msg, color, &show);
                        }
                        break;
                    }
                }
            }
        });

        Self {
            handle,
            shutdown,
            show_instructions,
        }
    }

    /// One-shot commands skip the key help
    fn quiet_instructions(self) -> Self {
        self.show_instructions
            .store(false, std::sync::atomic::Ordering::Relaxed);
        self
    }

    /// Print everything queued so far, then stop
    async fn finish(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.handle.await {
            warn!("Status renderer failed: {}", e);
        }
    }
}

fn render(msg: StatusMessage, color: bool, show_instructions: &std::sync::atomic::AtomicBool) {
    let show_instructions = show_instructions.load(std::sync::atomic::Ordering::Relaxed);
    let mut stdout = io::stdout();

    match msg {
        StatusMessage::Event(event) => print_event(&mut stdout, &event, color),
        StatusMessage::Instructions => {
            if show_instructions {
                print_instructions(&mut stdout, color);
            }
        }
        StatusMessage::ClearScreen => {
            let cleared = execute!(
                stdout,
                terminal::Clear(terminal::ClearType::All),
                cursor::MoveTo(0, 0)
            );
            if let Err(e) = cleared {
                warn!("Failed to clear screen: {}", e);
            }
            let banner = "nettoggle - network adapter switch";
            let banner = if color {
                banner.cyan().to_string()
            } else {
                banner.to_string()
            };
            let _ = write!(stdout, "{}\r\n\r\n", banner);
            print_instructions(&mut stdout, color);
        }
    }
    let _ = stdout.flush();
}

fn print_event(out: &mut impl Write, event: &StatusEvent, color: bool) {
    let timestamp = format!("[{}]", event.timestamp.format("%H:%M:%S"));
    if color {
        let message = match event.severity {
            Severity::Notice => event.message.as_str().grey(),
            Severity::Info => event.message.as_str().white(),
            Severity::Success => event.message.as_str().green(),
            Severity::Warning => event.message.as_str().yellow(),
            Severity::Error => event.message.as_str().red(),
        };
        let _ = write!(out, "{} {}\r\n", timestamp.cyan(), message);
    } else {
        let _ = write!(out, "{} {}\r\n", timestamp, event.message);
    }
}

fn print_instructions(out: &mut impl Write, color: bool) {
    for line in instructions() {
        let event = StatusEvent::new(Severity::Info, line);
        print_event(out, &event, color);
    }
    let _ = write!(out, "\r\n");
}
