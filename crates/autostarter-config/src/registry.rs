//! Validated settings and the loadout registry

use crate::schema::{RawConfig, RawEntry, RawLoadout, RawOptions};
use crate::CURRENT_CONFIG_VERSION;
use autostarter_api::{Loadout, LoadoutEntry};
use autostarter_util::LoadoutName;
use std::time::Duration;

/// Default grace period between SIGTERM and SIGKILL on shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Validated settings ready for use by the lifecycle controller
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub options: LaunchOptions,
    pub registry: LoadoutRegistry,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            options: LaunchOptions::from_raw(raw.options),
            registry: LoadoutRegistry::new(raw.loadouts.into_iter().map(convert_loadout).collect()),
        }
    }

    /// Convert back to the raw schema for saving
    pub fn to_raw(&self) -> RawConfig {
        RawConfig {
            config_version: CURRENT_CONFIG_VERSION,
            options: self.options.to_raw(),
            loadouts: self.registry.iter().map(convert_loadout_to_raw).collect(),
        }
    }
}

/// Launch behaviour switches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Launch `current_loadout` automatically on startup
    pub enabled: bool,

    /// Defer to a confirmation step instead of launching directly
    pub ask_to_launch: bool,

    /// Terminate tracked processes on shutdown
    pub autoclose: bool,

    pub current_loadout: Option<LoadoutName>,

    pub shutdown_timeout: Duration,
}

impl LaunchOptions {
    fn from_raw(raw: RawOptions) -> Self {
        Self {
            enabled: raw.enabled,
            ask_to_launch: raw.ask_to_launch,
            autoclose: raw.autoclose,
            current_loadout: raw.current_loadout.map(LoadoutName::from),
            shutdown_timeout: raw
                .shutdown_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT),
        }
    }

    fn to_raw(&self) -> RawOptions {
        RawOptions {
            enabled: self.enabled,
            ask_to_launch: self.ask_to_launch,
            autoclose: self.autoclose,
            current_loadout: self.current_loadout.as_ref().map(|n| n.to_string()),
            shutdown_timeout_secs: (self.shutdown_timeout != DEFAULT_SHUTDOWN_TIMEOUT)
                .then(|| self.shutdown_timeout.as_secs()),
        }
    }
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self::from_raw(RawOptions::default())
    }
}

/// Named loadouts, in configuration order
#[derive(Debug, Clone, Default)]
pub struct LoadoutRegistry {
    loadouts: Vec<Loadout>,
}

impl LoadoutRegistry {
    pub fn new(loadouts: Vec<Loadout>) -> Self {
        Self { loadouts }
    }

    /// Look up a loadout by exact name
    pub fn get_loadout(&self, name: &str) -> Option<&Loadout> {
        self.loadouts.iter().find(|l| l.name.as_str() == name)
    }

    pub fn names(&self) -> Vec<LoadoutName> {
        self.loadouts.iter().map(|l| l.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Loadout> {
        self.loadouts.iter()
    }

    pub fn len(&self) -> usize {
        self.loadouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loadouts.is_empty()
    }

    /// Add a loadout, replacing any existing one with the same name in place
    pub fn insert(&mut self, loadout: Loadout) {
        match self.loadouts.iter_mut().find(|l| l.name == loadout.name) {
            Some(existing) => *existing = loadout,
            None => self.loadouts.push(loadout),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Loadout> {
        let index = self.loadouts.iter().position(|l| l.name.as_str() == name)?;
        Some(self.loadouts.remove(index))
    }
}

fn convert_loadout(raw: RawLoadout) -> Loadout {
    Loadout::new(
        raw.name,
        raw.entries
            .into_iter()
            .map(|e| LoadoutEntry {
                path: e.path,
                args: e.args,
                cwd: e.cwd,
                env: e.env,
            })
            .collect(),
    )
}

fn convert_loadout_to_raw(loadout: &Loadout) -> RawLoadout {
    RawLoadout {
        name: loadout.name.to_string(),
        entries: loadout
            .entries
            .iter()
            .map(|e| RawEntry {
                path: e.path.clone(),
                args: e.args.clone(),
                cwd: e.cwd.clone(),
                env: e.env.clone(),
            })
            .collect(),
    }
}
