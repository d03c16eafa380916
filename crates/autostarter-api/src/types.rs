//! Loadout data model

use autostarter_util::LoadoutName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// One launchable program within a loadout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadoutEntry {
    /// Executable path (absolute, or resolved through `PATH`)
    pub path: String,

    /// Arguments, in order
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory for the child
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Extra environment variables layered over the inherited environment
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl LoadoutEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            cwd: None,
            env: HashMap::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Full argv: the program path followed by its arguments
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.path.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

/// A named, ordered collection of entries launched together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    pub name: LoadoutName,
    pub entries: Vec<LoadoutEntry>,
}

impl Loadout {
    pub fn new(name: impl Into<LoadoutName>, entries: Vec<LoadoutEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_puts_path_first() {
        let entry = LoadoutEntry::new("/usr/bin/obs-helper").with_args(["--minimized", "-v"]);
        assert_eq!(entry.argv(), vec!["/usr/bin/obs-helper", "--minimized", "-v"]);
    }

    #[test]
    fn entry_defaults_when_deserialized() {
        let entry: LoadoutEntry = serde_json::from_str(r#"{ "path": "/bin/true" }"#).unwrap();
        assert!(entry.args.is_empty());
        assert!(entry.cwd.is_none());
        assert!(entry.env.is_empty());
    }

    #[test]
    fn loadout_preserves_entry_order() {
        let loadout = Loadout::new(
            "Stream",
            vec![LoadoutEntry::new("first"), LoadoutEntry::new("second")],
        );
        assert_eq!(loadout.len(), 2);
        assert_eq!(loadout.entries[0].path, "first");
        assert_eq!(loadout.entries[1].path, "second");
    }
}
