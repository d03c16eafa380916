//! autostarter - launch a loadout of programs alongside a host session
//!
//! This binary stands in for the host application:
//! - Configuration loading
//! - Startup trigger (command-line override, auto-launch or confirmation)
//! - Waiting for the session to end (SIGTERM, SIGINT or SIGHUP)
//! - Shutdown trigger (terminate launched programs if autoclose is set)

mod prompt;

use anyhow::{Context, Result};
use autostarter_config::load_or_default;
use autostarter_core::{
    CoreError, LaunchPrompt, LifecycleController, ProcessTracker, PromptOutcome, StartupOutcome,
    StartupSelection,
};
use autostarter_host_linux::LinuxHost;
use autostarter_util::{AUTOSTARTER_CONFIG_ENV, LoadoutName, config_path_without_env};
use clap::Parser;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::prompt::TerminalPrompt;

/// How often exited programs are dropped from the tracker
const PRUNE_INTERVAL: Duration = Duration::from_secs(1);

/// autostarter - launch programs with your session, close them when it ends
#[derive(Parser, Debug)]
#[command(name = "autostarter")]
#[command(about = "Launch a loadout of programs and optionally close them on exit", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/autostarter/config.toml)
    #[arg(short, long, env = AUTOSTARTER_CONFIG_ENV, default_value_os_t = config_path_without_env())]
    config: PathBuf,

    /// Launch this loadout, ignoring the enabled and ask_to_launch options
    #[arg(short = 'l', long = "autostarter", visible_alias = "loadout", value_name = "LOADOUT")]
    loadout: Option<String>,

    /// Launch the default loadout without asking
    #[arg(short, long)]
    yes: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Signals that end the session
struct ShutdownSignals {
    term: Signal,
    int: Signal,
    hup: Signal,
}

impl ShutdownSignals {
    fn new() -> Result<Self> {
        Ok(Self {
            term: signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?,
            int: signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?,
            hup: signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?,
        })
    }

    /// Wait for the next one; returns its name
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.term.recv() => "SIGTERM",
            _ = self.int.recv() => "SIGINT",
            _ = self.hup.recv() => "SIGHUP",
        }
    }
}

/// Main service state
struct Service {
    controller: LifecycleController,
    selection: StartupSelection,
    assume_yes: bool,
}

impl Service {
    fn new(args: Args) -> Result<Self> {
        let settings = load_or_default(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            loadout_count = settings.registry.len(),
            enabled = settings.options.enabled,
            ask_to_launch = settings.options.ask_to_launch,
            autoclose = settings.options.autoclose,
            "Configuration loaded"
        );

        let selection =
            StartupSelection::resolve(args.loadout.map(LoadoutName::from), &settings.options);

        let host = Arc::new(LinuxHost::new());
        let tracker = Arc::new(ProcessTracker::new());
        let controller = LifecycleController::new(settings, host, tracker);

        Ok(Self {
            controller,
            selection,
            assume_yes: args.yes,
        })
    }

    async fn run(self) -> Result<()> {
        // Set up signal handlers before launching anything
        let mut signals = ShutdownSignals::new()?;

        let assume_yes = self.assume_yes;
        let started = startup(
            &self.controller,
            self.selection.clone(),
            move || TerminalPrompt::stdio(assume_yes),
            signals.recv(),
        )
        .await;

        match started {
            Some(result) => {
                report_startup(result);
                self.wait_for_session_end(&mut signals).await;
            }
            None => info!("Session ended during confirmation, nothing launched"),
        }

        let report = self.controller.on_shutdown();
        info!(
            requested = report.requested,
            failed = report.failed,
            "Shutdown complete"
        );
        Ok(())
    }

    async fn wait_for_session_end(&self, signals: &mut ShutdownSignals) {
        let mut prune_timer = tokio::time::interval(PRUNE_INTERVAL);

        info!("Waiting for session end");

        loop {
            tokio::select! {
                name = signals.recv() => {
                    info!(signal = name, "Received signal, shutting down");
                    return;
                }

                _ = prune_timer.tick() => {
                    let exited = self.controller.prune_exited();
                    if !exited.is_empty() {
                        debug!(count = exited.len(), "Launched programs exited");
                    }
                }
            }
        }
    }
}

/// Run the startup trigger, abandoning the confirmation step if `shutdown`
/// completes first
///
/// The prompt is built and asked on its own thread, since reading the
/// terminal blocks. Returns `None` when `shutdown` won; nothing is launched
/// then, and a later answer is discarded.
async fn startup<F, P>(
    controller: &LifecycleController,
    selection: StartupSelection,
    make_prompt: F,
    shutdown: impl Future,
) -> Option<Result<StartupOutcome, CoreError>>
where
    F: FnOnce() -> P + Send + 'static,
    P: LaunchPrompt,
{
    let answer = match selection {
        StartupSelection::Ask => {
            let available = controller.settings().registry.names();
            let current = controller.settings().options.current_loadout.clone();
            let (tx, rx) = oneshot::channel();

            // Not joined: a thread stuck reading stdin must not hold up exit
            std::thread::spawn(move || {
                let mut prompt = make_prompt();
                let _ = tx.send(prompt.confirm(&available, current.as_ref()));
            });

            tokio::select! {
                answer = rx => Some(answer.unwrap_or(PromptOutcome::Cancel)),
                _ = shutdown => return None,
            }
        }
        _ => None,
    };

    let mut answered = move |_: &[LoadoutName], _: Option<&LoadoutName>| {
        answer.clone().unwrap_or(PromptOutcome::Cancel)
    };
    Some(controller.on_startup(selection, &mut answered))
}

fn report_startup(result: Result<StartupOutcome, CoreError>) {
    match result {
        Ok(StartupOutcome::Launched(report)) => {
            for err in report.errors() {
                eprintln!("autostarter: {}", err);
            }
            if !report.is_complete_success() {
                warn!(
                    loadout = %report.loadout,
                    failed = report.failed(),
                    "Some programs failed to start"
                );
            }
        }
        Ok(StartupOutcome::Cancelled) | Ok(StartupOutcome::Skipped) => {}
        Err(e) => {
            // Surfaced to the user, but the session carries on
            error!(error = %e, "Startup launch failed");
            eprintln!("autostarter: {}", e);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "autostarter starting");

    let service = Service::new(args)?;
    service.run().await
}
