//! Configuration for autostarter
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Launch options (enabled, ask_to_launch, autoclose, current loadout)
//! - Named loadouts of programs to start together
//! - Validation with clear error messages

mod registry;
mod schema;
mod validation;

pub use registry::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load configuration, falling back to defaults if the file does not exist
pub fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "No config file found, using defaults");
        return Ok(Settings::default());
    }
    load_config(path)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Settings> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Settings::from_raw(raw))
}

/// Validate and write settings as TOML, creating parent directories as needed
pub fn save_config(path: impl AsRef<Path>, settings: &Settings) -> ConfigResult<()> {
    let path = path.as_ref();
    let raw = settings.to_raw();

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    let content = toml::to_string_pretty(&raw)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;

    debug!(path = %path.display(), loadouts = raw.loadouts.len(), "Configuration saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use autostarter_api::{Loadout, LoadoutEntry};
    use std::time::Duration;

    #[test]
    fn parse_minimal_config() {
        let config = r#"
            config_version = 1

            [[loadouts]]
            name = "Stream"
            entries = [{ path = "/usr/bin/chatterino" }]
        "#;

        let settings = parse_config(config).unwrap();
        assert_eq!(settings.registry.len(), 1);
        let loadout = settings.registry.get_loadout("Stream").unwrap();
        assert_eq!(loadout.entries[0].path, "/usr/bin/chatterino");
    }

    #[test]
    fn reject_wrong_version() {
        let config = r#"
            config_version = 99
        "#;

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_config() {
        let config = r#"
            config_version = 1

            [options]
            current_loadout = "Missing"
        "#;

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
    }

    #[test]
    fn shutdown_timeout_is_configurable() {
        let config = r#"
            config_version = 1

            [options]
            shutdown_timeout_secs = 2
        "#;

        let settings = parse_config(config).unwrap();
        assert_eq!(settings.options.shutdown_timeout, Duration::from_secs(2));
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.options.autoclose = true;
        settings.options.current_loadout = Some("Stream".into());
        settings.registry.insert(Loadout::new(
            "Stream",
            vec![
                LoadoutEntry::new("/usr/bin/chatterino"),
                LoadoutEntry::new("/opt/tuna/tuna")
                    .with_args(["--tray"])
                    .with_cwd("/opt/tuna")
                    .with_env("TUNA_PROFILE", "stream"),
            ],
        ));

        save_config(&path, &settings).unwrap();
        let reloaded = load_config(&path).unwrap();

        assert_eq!(reloaded.options, settings.options);
        assert_eq!(
            reloaded.registry.get_loadout("Stream"),
            settings.registry.get_loadout("Stream")
        );
    }

    #[test]
    fn save_rejects_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.options.current_loadout = Some("Missing".into());

        let result = save_config(&path, &settings);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_or_default(dir.path().join("absent.toml")).unwrap();
        assert!(settings.registry.is_empty());
        assert!(settings.options.enabled);
    }
}
