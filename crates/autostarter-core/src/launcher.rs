//! Best-effort loadout launcher

use autostarter_api::Loadout;
use autostarter_host_api::{HostError, ProcessHandle, ProcessHost};
use autostarter_util::LoadoutName;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::ProcessTracker;

/// Why a single loadout entry failed to start
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Spawn failed: {0}")]
    SpawnFailed(String),
}

impl From<HostError> for LaunchError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::NotFound(msg) => LaunchError::NotFound(msg),
            HostError::PermissionDenied(msg) => LaunchError::PermissionDenied(msg),
            HostError::SpawnFailed(msg) => LaunchError::SpawnFailed(msg),
            other => LaunchError::SpawnFailed(other.to_string()),
        }
    }
}

/// Per-entry outcome of launching a loadout, in entry order
#[derive(Debug, Clone)]
pub struct LaunchReport {
    pub loadout: LoadoutName,
    pub outcomes: Vec<Result<ProcessHandle, LaunchError>>,
}

impl LaunchReport {
    /// Handles of the entries that started
    pub fn handles(&self) -> impl Iterator<Item = &ProcessHandle> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }

    /// Errors of the entries that did not start
    pub fn errors(&self) -> impl Iterator<Item = &LaunchError> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }

    pub fn succeeded(&self) -> usize {
        self.handles().count()
    }

    pub fn failed(&self) -> usize {
        self.errors().count()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Starts every entry of a loadout and records the resulting handles
pub struct Launcher {
    host: Arc<dyn ProcessHost>,
    tracker: Arc<ProcessTracker>,
}

impl Launcher {
    pub fn new(host: Arc<dyn ProcessHost>, tracker: Arc<ProcessTracker>) -> Self {
        Self { host, tracker }
    }

    /// Launch each entry exactly once, in order
    ///
    /// A failing entry does not stop later ones. Each handle is registered
    /// with the tracker before the next entry is attempted.
    pub fn launch(&self, loadout: &Loadout) -> LaunchReport {
        info!(loadout = %loadout.name, entries = loadout.len(), "Launching loadout");

        let outcomes = loadout
            .entries
            .iter()
            .map(|entry| match self.host.spawn(entry) {
                Ok(handle) => {
                    self.tracker.register(&loadout.name, handle.clone());
                    info!(
                        loadout = %loadout.name,
                        program = %entry.path,
                        handle = %handle.id(),
                        "Program started"
                    );
                    Ok(handle)
                }
                Err(e) => {
                    let err = LaunchError::from(e);
                    warn!(
                        loadout = %loadout.name,
                        program = %entry.path,
                        error = %err,
                        "Program failed to start"
                    );
                    Err(err)
                }
            })
            .collect();

        let report = LaunchReport {
            loadout: loadout.name.clone(),
            outcomes,
        };

        info!(
            loadout = %report.loadout,
            started = report.succeeded(),
            failed = report.failed(),
            "Loadout launched"
        );

        report
    }
}
