//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Launch behaviour switches
    #[serde(default)]
    pub options: RawOptions,

    /// Named loadouts
    #[serde(default)]
    pub loadouts: Vec<RawLoadout>,
}

/// Options controlling when loadouts launch and whether they are closed
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawOptions {
    /// Launch the current loadout automatically on startup
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Ask for confirmation instead of launching straight away
    #[serde(default)]
    pub ask_to_launch: bool,

    /// Terminate launched programs when the host exits
    #[serde(default)]
    pub autoclose: bool,

    /// Loadout launched on startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_loadout: Option<String>,

    /// Grace period between SIGTERM and SIGKILL on shutdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shutdown_timeout_secs: Option<u64>,
}

impl Default for RawOptions {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            ask_to_launch: false,
            autoclose: false,
            current_loadout: None,
            shutdown_timeout_secs: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Raw loadout definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawLoadout {
    /// Unique loadout name
    pub name: String,

    /// Programs to launch, in order
    #[serde(default)]
    pub entries: Vec<RawEntry>,
}

/// Raw program entry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawEntry {
    /// Executable path
    pub path: String,

    /// Command-line arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Additional environment variables
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}
