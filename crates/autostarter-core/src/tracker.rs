//! Live process table

use autostarter_host_api::{HostError, ProcessHandle, ProcessHost};
use autostarter_util::LoadoutName;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Tracks every process handle started by the launcher, grouped by loadout
///
/// A handle enters the table only after its spawn succeeded and leaves it
/// when termination is issued or the process is seen to have exited.
#[derive(Debug, Default)]
pub struct ProcessTracker {
    table: Mutex<HashMap<LoadoutName, HashSet<ProcessHandle>>>,
}

impl ProcessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<LoadoutName, HashSet<ProcessHandle>>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Track a handle under a loadout; returns false if it was already tracked there
    pub fn register(&self, loadout: &LoadoutName, handle: ProcessHandle) -> bool {
        let inserted = self
            .lock()
            .entry(loadout.clone())
            .or_default()
            .insert(handle.clone());

        debug!(
            loadout = %loadout,
            handle = %handle.id(),
            inserted,
            "Registered process handle"
        );
        inserted
    }

    /// Stop tracking a handle; returns false if it was not tracked
    pub fn unregister(&self, handle: &ProcessHandle) -> bool {
        let mut table = self.lock();

        let mut removed = false;
        for handles in table.values_mut() {
            removed |= handles.remove(handle);
        }
        table.retain(|_, handles| !handles.is_empty());

        if removed {
            debug!(handle = %handle.id(), "Unregistered process handle");
        }
        removed
    }

    /// Snapshot of every tracked handle across all loadouts, unordered
    pub fn all_handles(&self) -> Vec<ProcessHandle> {
        let table = self.lock();
        let unique: HashSet<&ProcessHandle> = table.values().flatten().collect();
        unique.into_iter().cloned().collect()
    }

    /// Snapshot of the handles tracked for one loadout
    pub fn handles_for(&self, loadout: &str) -> Vec<ProcessHandle> {
        self.lock()
            .iter()
            .filter(|(name, _)| name.as_str() == loadout)
            .flat_map(|(_, handles)| handles.iter().cloned())
            .collect()
    }

    pub fn contains(&self, handle: &ProcessHandle) -> bool {
        self.lock().values().any(|handles| handles.contains(handle))
    }

    pub fn len(&self) -> usize {
        self.all_handles().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop handles whose processes have exited, returning them
    ///
    /// Handles the host no longer recognises are dropped too. Other host
    /// errors leave the handle tracked.
    pub fn prune_exited(&self, host: &dyn ProcessHost) -> Vec<ProcessHandle> {
        let mut exited = Vec::new();

        // Host calls happen outside the table lock
        for handle in self.all_handles() {
            match host.try_wait(&handle) {
                Ok(Some(status)) => {
                    debug!(handle = %handle.id(), program = %handle.program(), status = ?status, "Tracked process exited");
                    exited.push(handle);
                }
                Ok(None) => {}
                Err(HostError::UnknownHandle) => exited.push(handle),
                Err(e) => {
                    warn!(handle = %handle.id(), error = %e, "Error checking process status");
                }
            }
        }

        for handle in &exited {
            self.unregister(handle);
        }
        exited
    }
}
