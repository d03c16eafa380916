//! Unix process host for autostarter
//!
//! Provides:
//! - Process spawning with process group isolation
//! - Graceful (SIGTERM) and forceful (SIGKILL) termination
//! - Exit observation

mod adapter;
mod process;

pub use adapter::*;
pub use process::*;
