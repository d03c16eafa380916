//! Configuration validation

use crate::schema::{RawConfig, RawEntry, RawLoadout};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Loadout '{loadout}', entry {index}: {message}")]
    EntryError {
        loadout: String,
        index: usize,
        message: String,
    },

    #[error("Duplicate loadout name: {0}")]
    DuplicateLoadoutName(String),

    #[error("Loadout name cannot be empty")]
    EmptyLoadoutName,

    #[error("Current loadout '{0}' is not defined")]
    UnknownCurrentLoadout(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut seen_names = HashSet::new();
    for loadout in &config.loadouts {
        if !seen_names.insert(loadout.name.as_str()) {
            errors.push(ValidationError::DuplicateLoadoutName(loadout.name.clone()));
        }
    }

    for loadout in &config.loadouts {
        errors.extend(validate_loadout(loadout));
    }

    if let Some(current) = &config.options.current_loadout
        && !seen_names.contains(current.as_str())
    {
        errors.push(ValidationError::UnknownCurrentLoadout(current.clone()));
    }

    errors
}

fn validate_loadout(loadout: &RawLoadout) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if loadout.name.trim().is_empty() {
        errors.push(ValidationError::EmptyLoadoutName);
    }

    for (index, entry) in loadout.entries.iter().enumerate() {
        if let Err(message) = validate_entry(entry) {
            errors.push(ValidationError::EntryError {
                loadout: loadout.name.clone(),
                index,
                message,
            });
        }
    }

    errors
}

fn validate_entry(entry: &RawEntry) -> Result<(), String> {
    if entry.path.trim().is_empty() {
        return Err("path cannot be empty".into());
    }

    if let Some(cwd) = &entry.cwd
        && cwd.as_os_str().is_empty()
    {
        return Err("cwd cannot be empty when set".into());
    }

    if entry.env.keys().any(|k| k.is_empty() || k.contains('=')) {
        return Err("environment variable names must be non-empty and contain no '='".into());
    }

    Ok(())
}
