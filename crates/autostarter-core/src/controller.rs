//! Lifecycle controller: startup and shutdown triggers

use autostarter_config::{LaunchOptions, Settings};
use autostarter_host_api::{ProcessHandle, ProcessHost, StopMode};
use autostarter_util::LoadoutName;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{LaunchReport, Launcher, ProcessTracker};

/// Errors surfaced to whoever triggered a launch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Loadout '{0}' not found")]
    LoadoutNotFound(LoadoutName),
}

/// What to do on startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupSelection {
    /// One-shot override (e.g. a command-line flag)
    Explicit(LoadoutName),
    /// The configured current loadout, auto-launch being enabled
    Configured(LoadoutName),
    /// Defer to the confirmation step
    Ask,
    Nothing,
}

impl StartupSelection {
    /// Pick the startup action; an override beats every option
    pub fn resolve(override_name: Option<LoadoutName>, options: &LaunchOptions) -> Self {
        if let Some(name) = override_name.filter(|n| !n.is_empty()) {
            return Self::Explicit(name);
        }

        if !options.enabled {
            return Self::Nothing;
        }

        if options.ask_to_launch {
            return Self::Ask;
        }

        match &options.current_loadout {
            Some(name) => Self::Configured(name.clone()),
            None => Self::Nothing,
        }
    }
}

/// Answer from the confirmation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Launch(LoadoutName),
    Cancel,
}

/// External confirmation step, e.g. a dialog or terminal prompt
pub trait LaunchPrompt {
    /// Choose a loadout to launch from `available`, or cancel
    fn confirm(&mut self, available: &[LoadoutName], current: Option<&LoadoutName>) -> PromptOutcome;
}

impl<F> LaunchPrompt for F
where
    F: FnMut(&[LoadoutName], Option<&LoadoutName>) -> PromptOutcome,
{
    fn confirm(&mut self, available: &[LoadoutName], current: Option<&LoadoutName>) -> PromptOutcome {
        self(available, current)
    }
}

/// Result of the startup trigger
#[derive(Debug, Clone)]
pub enum StartupOutcome {
    Launched(LaunchReport),
    Cancelled,
    Skipped,
}

/// Result of a termination pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Termination requests issued
    pub requested: usize,
    /// Requests the host reported as failed
    pub failed: usize,
}

/// Orchestrates launching loadouts and terminating what was launched
///
/// Holds no state of its own beyond its collaborators. The tracker is the
/// only shared mutable state.
pub struct LifecycleController {
    settings: Settings,
    host: Arc<dyn ProcessHost>,
    tracker: Arc<ProcessTracker>,
    launcher: Launcher,
}

impl LifecycleController {
    pub fn new(settings: Settings, host: Arc<dyn ProcessHost>, tracker: Arc<ProcessTracker>) -> Self {
        info!(
            loadout_count = settings.registry.len(),
            autoclose = settings.options.autoclose,
            "Lifecycle controller initialized"
        );

        let launcher = Launcher::new(host.clone(), tracker.clone());
        Self {
            settings,
            host,
            tracker,
            launcher,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tracker(&self) -> &Arc<ProcessTracker> {
        &self.tracker
    }

    /// Host startup hook
    pub fn on_startup(
        &self,
        selection: StartupSelection,
        prompt: &mut dyn LaunchPrompt,
    ) -> Result<StartupOutcome, CoreError> {
        debug!(selection = ?selection, "Startup trigger");

        let name = match selection {
            StartupSelection::Explicit(name) | StartupSelection::Configured(name) => name,
            StartupSelection::Ask => {
                let available = self.settings.registry.names();
                let current = self.settings.options.current_loadout.as_ref();
                match prompt.confirm(&available, current) {
                    PromptOutcome::Launch(name) => name,
                    PromptOutcome::Cancel => {
                        info!("Launch cancelled at confirmation");
                        return Ok(StartupOutcome::Cancelled);
                    }
                }
            }
            StartupSelection::Nothing => {
                debug!("Nothing to launch on startup");
                return Ok(StartupOutcome::Skipped);
            }
        };

        self.launch_loadout(name.as_str()).map(StartupOutcome::Launched)
    }

    /// Launch a loadout by name; also the handler for menu actions
    pub fn launch_loadout(&self, name: &str) -> Result<LaunchReport, CoreError> {
        let Some(loadout) = self.settings.registry.get_loadout(name) else {
            error!(loadout = %name, "Loadout not found");
            return Err(CoreError::LoadoutNotFound(LoadoutName::new(name)));
        };

        Ok(self.launcher.launch(loadout))
    }

    /// Host shutdown hook; terminates tracked processes only with autoclose
    pub fn on_shutdown(&self) -> ShutdownReport {
        if !self.settings.options.autoclose {
            info!(
                running = self.tracker.len(),
                "Autoclose disabled, leaving launched programs running"
            );
            return ShutdownReport::default();
        }

        self.terminate_all()
    }

    /// Ask every tracked process to terminate, regardless of autoclose
    ///
    /// Failures are logged and otherwise ignored; every handle is dropped
    /// from the tracker once its request has been issued.
    pub fn terminate_all(&self) -> ShutdownReport {
        let handles = self.tracker.all_handles();
        let mode = StopMode::Graceful {
            timeout: self.settings.options.shutdown_timeout,
        };

        info!(count = handles.len(), mode = ?mode, "Terminating launched programs");

        let mut report = ShutdownReport::default();
        for handle in handles {
            report.requested += 1;
            if let Err(e) = self.host.stop(&handle, mode) {
                report.failed += 1;
                warn!(
                    handle = %handle.id(),
                    program = %handle.program(),
                    error = %e,
                    "Failed to terminate program"
                );
            }
            self.tracker.unregister(&handle);
        }

        info!(requested = report.requested, failed = report.failed, "Termination complete");
        report
    }

    /// Forget handles whose processes have already exited
    pub fn prune_exited(&self) -> Vec<ProcessHandle> {
        self.tracker.prune_exited(self.host.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autostarter_api::{Loadout, LoadoutEntry};
    use autostarter_config::LoadoutRegistry;
    use autostarter_host_api::{ExitStatus, MockFailure, MockHost};
    use std::time::Duration;

    fn make_test_settings() -> Settings {
        Settings {
            options: LaunchOptions {
                current_loadout: Some("Stream".into()),
                ..LaunchOptions::default()
            },
            registry: LoadoutRegistry::new(vec![
                Loadout::new(
                    "Stream",
                    vec![
                        LoadoutEntry::new("/usr/bin/chatterino"),
                        LoadoutEntry::new("/opt/tuna/tuna").with_args(["--tray"]),
                    ],
                ),
                Loadout::new("Recording", vec![LoadoutEntry::new("/usr/bin/pavucontrol")]),
            ]),
        }
    }

    fn controller(settings: Settings) -> (Arc<MockHost>, LifecycleController) {
        let host = Arc::new(MockHost::new());
        let controller = LifecycleController::new(settings, host.clone(), Arc::new(ProcessTracker::new()));
        (host, controller)
    }

    fn no_prompt(_: &[LoadoutName], _: Option<&LoadoutName>) -> PromptOutcome {
        panic!("prompt should not be consulted");
    }

    #[test]
    fn test_resolve_override_wins() {
        let options = LaunchOptions {
            enabled: false,
            ask_to_launch: true,
            ..LaunchOptions::default()
        };

        let selection = StartupSelection::resolve(Some("Recording".into()), &options);
        assert_eq!(selection, StartupSelection::Explicit("Recording".into()));
    }

    #[test]
    fn test_resolve_from_options() {
        let mut options = LaunchOptions {
            current_loadout: Some("Stream".into()),
            ..LaunchOptions::default()
        };
        assert_eq!(
            StartupSelection::resolve(None, &options),
            StartupSelection::Configured("Stream".into())
        );

        // An empty override counts as no override
        assert_eq!(
            StartupSelection::resolve(Some("".into()), &options),
            StartupSelection::Configured("Stream".into())
        );

        options.ask_to_launch = true;
        assert_eq!(StartupSelection::resolve(None, &options), StartupSelection::Ask);

        options.enabled = false;
        assert_eq!(StartupSelection::resolve(None, &options), StartupSelection::Nothing);

        let unset = LaunchOptions::default();
        assert_eq!(StartupSelection::resolve(None, &unset), StartupSelection::Nothing);
    }

    #[test]
    fn test_startup_launches_configured_loadout() {
        let (host, controller) = controller(make_test_settings());

        let outcome = controller
            .on_startup(StartupSelection::Configured("Stream".into()), &mut no_prompt)
            .unwrap();

        match outcome {
            StartupOutcome::Launched(report) => {
                assert_eq!(report.loadout.as_str(), "Stream");
                assert_eq!(report.succeeded(), 2);
            }
            other => panic!("Expected launch, got {:?}", other),
        }
        assert_eq!(host.running().len(), 2);
        assert_eq!(controller.tracker().len(), 2);
    }

    #[test]
    fn test_startup_unknown_loadout() {
        let (host, controller) = controller(make_test_settings());

        let result = controller.on_startup(StartupSelection::Explicit("Podcast".into()), &mut no_prompt);

        assert_eq!(result.unwrap_err(), CoreError::LoadoutNotFound("Podcast".into()));
        assert_eq!(host.spawn_count(), 0);
    }

    #[test]
    fn test_whitespace_override_is_looked_up() {
        let (host, controller) = controller(make_test_settings());

        let selection = StartupSelection::resolve(Some("  ".into()), &controller.settings().options);
        assert_eq!(selection, StartupSelection::Explicit("  ".into()));

        let result = controller.on_startup(selection, &mut no_prompt);
        assert_eq!(result.unwrap_err(), CoreError::LoadoutNotFound("  ".into()));
        assert_eq!(host.spawn_count(), 0);
    }

    #[test]
    fn test_startup_ask_uses_prompt_choice() {
        let (host, controller) = controller(make_test_settings());

        let mut offered = Vec::new();
        let mut prompt = |available: &[LoadoutName], current: Option<&LoadoutName>| {
            offered = available.to_vec();
            assert_eq!(current.map(|c| c.as_str()), Some("Stream"));
            PromptOutcome::Launch("Recording".into())
        };

        let outcome = controller.on_startup(StartupSelection::Ask, &mut prompt).unwrap();

        assert!(matches!(outcome, StartupOutcome::Launched(ref r) if r.loadout.as_str() == "Recording"));
        assert_eq!(offered, vec![LoadoutName::new("Stream"), LoadoutName::new("Recording")]);
        assert_eq!(host.running(), vec![LoadoutEntry::new("/usr/bin/pavucontrol")]);
    }

    #[test]
    fn test_startup_ask_cancelled() {
        let (host, controller) = controller(make_test_settings());

        let mut prompt = |_: &[LoadoutName], _: Option<&LoadoutName>| PromptOutcome::Cancel;
        let outcome = controller.on_startup(StartupSelection::Ask, &mut prompt).unwrap();

        assert!(matches!(outcome, StartupOutcome::Cancelled));
        assert_eq!(host.spawn_count(), 0);
    }

    #[test]
    fn test_startup_nothing() {
        let (host, controller) = controller(make_test_settings());

        let outcome = controller.on_startup(StartupSelection::Nothing, &mut no_prompt).unwrap();

        assert!(matches!(outcome, StartupOutcome::Skipped));
        assert_eq!(host.spawn_count(), 0);
    }

    #[test]
    fn test_shutdown_without_autoclose_leaves_processes() {
        let (host, controller) = controller(make_test_settings());
        controller.launch_loadout("Stream").unwrap();

        let report = controller.on_shutdown();

        assert_eq!(report, ShutdownReport::default());
        assert!(host.stop_calls().is_empty());
        assert_eq!(host.running().len(), 2);
        assert_eq!(controller.tracker().len(), 2);
    }

    #[test]
    fn test_shutdown_with_autoclose_stops_every_handle() {
        let mut settings = make_test_settings();
        settings.options.autoclose = true;
        settings.options.shutdown_timeout = Duration::from_secs(3);
        let (host, controller) = controller(settings);

        controller.launch_loadout("Stream").unwrap();
        controller.launch_loadout("Recording").unwrap();
        let tracked = controller.tracker().all_handles();

        let report = controller.on_shutdown();

        assert_eq!(report.requested, 3);
        assert_eq!(report.failed, 0);

        let calls = host.stop_calls();
        assert_eq!(calls.len(), tracked.len());
        for handle in &tracked {
            assert!(calls.iter().any(|(h, _)| h == handle));
        }
        assert!(calls.iter().all(|(_, mode)| *mode
            == StopMode::Graceful {
                timeout: Duration::from_secs(3)
            }));
        assert!(host.running().is_empty());
        assert!(controller.tracker().is_empty());
    }

    #[test]
    fn test_shutdown_swallows_stop_failures() {
        let mut settings = make_test_settings();
        settings.options.autoclose = true;
        let (host, controller) = controller(settings);

        controller.launch_loadout("Stream").unwrap();
        *host.fail_stop.lock().unwrap() = true;

        let report = controller.on_shutdown();

        assert_eq!(report.requested, 2);
        assert_eq!(report.failed, 2);
        assert!(controller.tracker().is_empty());
    }

    #[test]
    fn test_terminate_all_ignores_autoclose() {
        let (host, controller) = controller(make_test_settings());
        controller.launch_loadout("Recording").unwrap();

        let report = controller.terminate_all();

        assert_eq!(report.requested, 1);
        assert_eq!(host.stop_calls().len(), 1);
    }

    #[test]
    fn test_prune_exited() {
        let (host, controller) = controller(make_test_settings());
        let report = controller.launch_loadout("Stream").unwrap();
        let first = report.handles().next().unwrap().clone();

        host.simulate_exit(&first, ExitStatus::with_code(1));

        assert_eq!(controller.prune_exited(), vec![first]);
        assert_eq!(controller.tracker().len(), 1);
    }

    #[test]
    fn test_partial_launch_failure_is_not_an_error() {
        let (host, controller) = controller(make_test_settings());
        host.fail_path("/opt/tuna/tuna", MockFailure::SpawnFailed);

        let report = controller.launch_loadout("Stream").unwrap();

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(controller.tracker().len(), 1);
    }
}
