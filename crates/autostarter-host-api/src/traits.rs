//! Process host traits

use autostarter_api::LoadoutEntry;
use std::time::Duration;
use thiserror::Error;

use crate::{ExitStatus, ProcessHandle};

/// Errors from process host operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Stop failed: {0}")]
    StopFailed(String),

    #[error("Unknown process handle")]
    UnknownHandle,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Stop mode for process termination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// Ask the process to exit, then force it once the timeout elapses
    Graceful { timeout: Duration },
    /// Force immediate termination
    Force,
}

impl Default for StopMode {
    fn default() -> Self {
        Self::Graceful {
            timeout: Duration::from_secs(5),
        }
    }
}

/// Process host trait - implemented by platform-specific hosts
///
/// All calls are synchronous. `spawn` returns as soon as the OS has
/// started the child; it never waits on the child's execution.
pub trait ProcessHost: Send + Sync {
    /// Start a program described by a loadout entry
    fn spawn(&self, entry: &LoadoutEntry) -> HostResult<ProcessHandle>;

    /// Stop a running process
    fn stop(&self, handle: &ProcessHandle, mode: StopMode) -> HostResult<()>;

    /// Non-blocking exit check; `Ok(None)` while the process is still running
    fn try_wait(&self, handle: &ProcessHandle) -> HostResult<Option<ExitStatus>>;
}
