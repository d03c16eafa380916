//! Shared utilities for autostarter
//!
//! This crate provides:
//! - ID types (LoadoutName, HandleId)
//! - Default config file path

mod ids;
mod paths;

pub use ids::*;
pub use paths::*;
