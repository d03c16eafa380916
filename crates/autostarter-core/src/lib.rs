//! Loadout process lifecycle for autostarter
//!
//! This crate is the heart of autostarter, containing:
//! - The launcher (start every entry of a loadout, best-effort)
//! - The process tracker (which handles are live, per loadout)
//! - The lifecycle controller (startup and shutdown triggers)

mod controller;
mod launcher;
mod tracker;

pub use controller::*;
pub use launcher::*;
pub use tracker::*;
