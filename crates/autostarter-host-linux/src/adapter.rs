//! Unix process host implementation

use autostarter_api::LoadoutEntry;
use autostarter_host_api::{
    ExitStatus, HandlePayload, HostError, HostResult, ProcessHandle, ProcessHost, StopMode,
};
use autostarter_util::HandleId;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

use crate::process::{ManagedProcess, command_line};

/// How long to wait for the kernel to reap a child after the last signal
const KILL_REAP_TIMEOUT: Duration = Duration::from_millis(500);

/// Unix process host
///
/// Owns the `Child` of every process it started, keyed by handle id so a
/// stale handle never reaches a process that reused its pid. Dropping the
/// host does not stop its children.
pub struct LinuxHost {
    processes: Mutex<HashMap<HandleId, ManagedProcess>>,
}

impl LinuxHost {
    pub fn new() -> Self {
        Self {
            processes: Mutex::new(HashMap::new()),
        }
    }

    /// Number of children not yet observed to exit
    pub fn tracked_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<HandleId, ManagedProcess>> {
        self.processes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait briefly for a signalled child to be reaped
    ///
    /// A child that outlives a failed signal goes back into the table, so a
    /// later `stop` or `try_wait` can still reach it.
    fn reap(
        &self,
        handle: &ProcessHandle,
        mut proc: ManagedProcess,
        signalled: HostResult<()>,
    ) -> HostResult<()> {
        let pid = proc.pid;

        if let Err(e) = &signalled {
            warn!(pid = pid, program = %handle.program(), error = %e, "Failed to signal process group");
        }

        match proc.wait_timeout(KILL_REAP_TIMEOUT)? {
            Some(status) => info!(pid = pid, status = ?status, "Process stopped"),
            None if signalled.is_err() => {
                self.lock().insert(handle.id(), proc);
            }
            None => warn!(pid = pid, "Process not reaped after SIGKILL"),
        }

        signalled
    }
}

impl Default for LinuxHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessHost for LinuxHost {
    fn spawn(&self, entry: &LoadoutEntry) -> HostResult<ProcessHandle> {
        let proc = ManagedProcess::spawn(entry)?;

        let pid = proc.pid;
        let pgid = proc.pgid;
        let handle = ProcessHandle::new(entry.path.clone(), HandlePayload::Unix { pid, pgid });

        self.lock().insert(handle.id(), proc);

        info!(pid = pid, pgid = pgid, command = %command_line(entry), "Spawned process");

        Ok(handle)
    }

    fn stop(&self, handle: &ProcessHandle, mode: StopMode) -> HostResult<()> {
        // Take the child out so polling below does not hold the lock
        let Some(mut proc) = self.lock().remove(&handle.id()) else {
            warn!(handle = %handle.id(), "No tracked process for handle");
            return Err(HostError::UnknownHandle);
        };
        let pid = proc.pid;

        let signalled = match mode {
            StopMode::Graceful { timeout } => match proc.terminate() {
                Ok(()) => {
                    info!(pid = pid, program = %handle.program(), "Sent SIGTERM to process group");

                    if let Some(status) = proc.wait_timeout(timeout)? {
                        info!(pid = pid, status = ?status, "Process exited after SIGTERM");
                        return Ok(());
                    }

                    warn!(pid = pid, timeout = ?timeout, "Process ignored SIGTERM, sending SIGKILL");
                    proc.kill()
                }
                Err(e) => Err(e),
            },
            StopMode::Force => {
                info!(pid = pid, program = %handle.program(), "Sending SIGKILL to process group");
                proc.kill()
            }
        };

        self.reap(handle, proc, signalled)
    }

    fn try_wait(&self, handle: &ProcessHandle) -> HostResult<Option<ExitStatus>> {
        let mut procs = self.lock();
        let proc = procs.get_mut(&handle.id()).ok_or(HostError::UnknownHandle)?;

        let status = proc.try_wait()?;
        if let Some(status) = &status {
            info!(pid = proc.pid, status = ?status, "Process exited");
            procs.remove(&handle.id());
        }

        Ok(status)
    }
}
