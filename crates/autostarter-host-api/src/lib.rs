//! Process host trait interfaces for autostarter
//!
//! This crate defines the interface between the lifecycle core and
//! platform-specific process management. It contains no platform code itself.

mod handle;
mod mock;
mod traits;

pub use handle::*;
pub use mock::*;
pub use traits::*;
