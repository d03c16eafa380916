//! Process handle abstraction

use autostarter_util::HandleId;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Opaque handle to a process started by a host
///
/// Created by the host when a spawn succeeds. Clones compare equal, so a
/// handle can be stored in sets and removed again by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessHandle {
    id: HandleId,

    /// Program path the process was started from
    program: String,

    started_at: DateTime<Local>,

    /// Platform-specific payload (opaque to core)
    payload: HandlePayload,
}

impl ProcessHandle {
    pub fn new(program: impl Into<String>, payload: HandlePayload) -> Self {
        Self {
            id: HandleId::new(),
            program: program.into(),
            started_at: Local::now(),
            payload,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn payload(&self) -> &HandlePayload {
        &self.payload
    }
}

/// Platform-specific handle payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum HandlePayload {
    /// Unix: process id and the process group it leads
    Unix { pid: u32, pgid: u32 },

    /// Mock for testing
    Mock { id: u64 },
}

impl HandlePayload {
    /// Get the process ID if applicable
    pub fn pid(&self) -> Option<u32> {
        match self {
            HandlePayload::Unix { pid, .. } => Some(*pid),
            HandlePayload::Mock { .. } => None,
        }
    }
}

/// Exit status of a tracked process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStatus {
    /// Exit code if the process exited normally
    pub code: Option<i32>,

    /// Signal number if the process was killed by a signal (Unix)
    pub signal: Option<i32>,
}

impl ExitStatus {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            signal: None,
        }
    }

    pub fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    pub fn signaled(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}
