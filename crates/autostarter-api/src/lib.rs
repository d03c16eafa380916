//! Shared types for autostarter
//!
//! Defines what a loadout is: a named, ordered list of programs that are
//! launched together. Used by the config, host and core crates.

mod types;

pub use types::*;
