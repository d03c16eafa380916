//! Mock process host for testing

use autostarter_api::LoadoutEntry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    ExitStatus, HandlePayload, HostError, HostResult, ProcessHandle, ProcessHost, StopMode,
};

/// Failure the mock reports when spawning a particular path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    NotFound,
    PermissionDenied,
    SpawnFailed,
}

/// Mock process state for testing
#[derive(Debug, Clone)]
pub struct MockProcess {
    pub handle: ProcessHandle,
    pub entry: LoadoutEntry,
    pub exit_status: Option<ExitStatus>,
}

/// Mock process host for unit/integration testing
pub struct MockHost {
    next_id: AtomicU64,
    processes: Arc<Mutex<HashMap<u64, MockProcess>>>,
    failures: Arc<Mutex<HashMap<String, MockFailure>>>,
    stop_calls: Arc<Mutex<Vec<(ProcessHandle, StopMode)>>>,

    /// Configure stop to fail
    pub fail_stop: Arc<Mutex<bool>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            processes: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            stop_calls: Arc::new(Mutex::new(Vec::new())),
            fail_stop: Arc::new(Mutex::new(false)),
        }
    }

    /// Make every spawn of `path` fail with `failure`
    pub fn fail_path(&self, path: impl Into<String>, failure: MockFailure) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), failure);
    }

    /// Entries of processes that have not exited or been stopped
    pub fn running(&self) -> Vec<LoadoutEntry> {
        self.processes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|p| p.exit_status.is_none())
            .map(|p| p.entry.clone())
            .collect()
    }

    /// Number of successful spawns so far
    pub fn spawn_count(&self) -> usize {
        self.processes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Every stop request received, in order
    pub fn stop_calls(&self) -> Vec<(ProcessHandle, StopMode)> {
        self.stop_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Simulate a process exiting on its own
    pub fn simulate_exit(&self, handle: &ProcessHandle, status: ExitStatus) {
        let HandlePayload::Mock { id } = handle.payload() else {
            return;
        };

        let mut processes = self.processes.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(process) = processes.get_mut(id) {
            process.exit_status = Some(status);
        }
    }

    fn mock_id(handle: &ProcessHandle) -> HostResult<u64> {
        match handle.payload() {
            HandlePayload::Mock { id } => Ok(*id),
            _ => Err(HostError::UnknownHandle),
        }
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessHost for MockHost {
    fn spawn(&self, entry: &LoadoutEntry) -> HostResult<ProcessHandle> {
        let failure = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&entry.path)
            .copied();

        match failure {
            Some(MockFailure::NotFound) => {
                return Err(HostError::NotFound(format!("Mock: {}", entry.path)));
            }
            Some(MockFailure::PermissionDenied) => {
                return Err(HostError::PermissionDenied(format!("Mock: {}", entry.path)));
            }
            Some(MockFailure::SpawnFailed) => {
                return Err(HostError::SpawnFailed(format!("Mock: {}", entry.path)));
            }
            None => {}
        }

        let mock_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let handle = ProcessHandle::new(entry.path.clone(), HandlePayload::Mock { id: mock_id });

        self.processes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                mock_id,
                MockProcess {
                    handle: handle.clone(),
                    entry: entry.clone(),
                    exit_status: None,
                },
            );

        Ok(handle)
    }

    fn stop(&self, handle: &ProcessHandle, mode: StopMode) -> HostResult<()> {
        self.stop_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((handle.clone(), mode));

        if *self.fail_stop.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(HostError::StopFailed("Mock stop failure".into()));
        }

        let mock_id = Self::mock_id(handle)?;
        let mut processes = self.processes.lock().unwrap_or_else(PoisonError::into_inner);
        match processes.get_mut(&mock_id) {
            Some(process) => {
                if process.exit_status.is_none() {
                    process.exit_status = Some(ExitStatus::signaled(15)); // SIGTERM
                }
                Ok(())
            }
            None => Err(HostError::UnknownHandle),
        }
    }

    fn try_wait(&self, handle: &ProcessHandle) -> HostResult<Option<ExitStatus>> {
        let mock_id = Self::mock_id(handle)?;
        self.processes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&mock_id)
            .map(|p| p.exit_status.clone())
            .ok_or(HostError::UnknownHandle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_spawn_and_stop() {
        let host = MockHost::new();
        let handle = host.spawn(&LoadoutEntry::new("/bin/true")).unwrap();

        assert_eq!(host.running().len(), 1);
        assert_eq!(host.try_wait(&handle).unwrap(), None);

        host.stop(&handle, StopMode::Force).unwrap();

        assert!(host.running().is_empty());
        assert_eq!(host.try_wait(&handle).unwrap(), Some(ExitStatus::signaled(15)));
        assert_eq!(host.stop_calls().len(), 1);
    }

    #[test]
    fn mock_spawn_failure_for_path() {
        let host = MockHost::new();
        host.fail_path("/does/not/exist", MockFailure::SpawnFailed);

        let result = host.spawn(&LoadoutEntry::new("/does/not/exist"));
        assert!(matches!(result, Err(HostError::SpawnFailed(_))));
        assert!(host.spawn(&LoadoutEntry::new("/bin/true")).is_ok());
        assert_eq!(host.spawn_count(), 1);
    }

    #[test]
    fn mock_stop_failure_is_recorded() {
        let host = MockHost::new();
        let handle = host.spawn(&LoadoutEntry::new("/bin/true")).unwrap();
        *host.fail_stop.lock().unwrap() = true;

        assert!(host.stop(&handle, StopMode::default()).is_err());
        assert_eq!(host.stop_calls().len(), 1);
        assert_eq!(host.running().len(), 1);
    }

    #[test]
    fn simulated_exit_is_observed() {
        let host = MockHost::new();
        let handle = host.spawn(&LoadoutEntry::new("/bin/true")).unwrap();

        host.simulate_exit(&handle, ExitStatus::success());
        assert_eq!(host.try_wait(&handle).unwrap(), Some(ExitStatus::success()));
    }
}
