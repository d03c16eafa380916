//! Config validation CLI tool
//!
//! Validates an autostarter configuration file and reports any errors.

use autostarter_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates an autostarter configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match autostarter_config::load_config(&config_path) {
        Ok(settings) => {
            let options = &settings.options;
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", autostarter_config::CURRENT_CONFIG_VERSION);
            println!("  Enabled: {}", options.enabled);
            println!("  Ask to launch: {}", options.ask_to_launch);
            println!("  Autoclose: {}", options.autoclose);
            match &options.current_loadout {
                Some(name) => println!("  Current loadout: {}", name),
                None => println!("  Current loadout: (none)"),
            }
            println!("  Loadouts: {}", settings.registry.len());

            for loadout in settings.registry.iter() {
                println!();
                println!("  {} ({} programs):", loadout.name, loadout.len());
                for entry in &loadout.entries {
                    println!("    - {}", entry.argv().join(" "));
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                autostarter_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                autostarter_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                autostarter_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                autostarter_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        autostarter_config::CURRENT_CONFIG_VERSION
                    );
                }
                other => eprintln!("{}", other),
            }
            ExitCode::from(1)
        }
    }
}
