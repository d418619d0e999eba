//! Config validation CLI tool
//!
//! Validates a curfew configuration file and reports any errors.

use curfew_config::{ConfigError, SlotSpec, CURRENT_CONFIG_VERSION};
use curfew_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn describe(slot: &SlotSpec) -> String {
    let days: Vec<String> = slot.days.iter().map(|d| format!("{:?}", d)).collect();
    format!("{}-{} on {}", slot.start, slot.end, days.join(", "))
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a curfew configuration file.");
            eprintln!();
            eprintln!("Default location: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match curfew_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", CURRENT_CONFIG_VERSION);
            println!(
                "  Reconcile every: {}s",
                policy.service.reconcile_interval.as_secs()
            );
            println!("  Cache TTL: {}s", policy.service.cache_ttl.as_secs());
            println!("  Page size: {}", policy.service.page_size);
            println!("  Distractive apps: {}", policy.distractive.len());
            println!("  Seeded apps: {}", policy.apps.len());

            for app in &policy.apps {
                println!();
                println!(
                    "  - {}{}",
                    app.package_id,
                    if app.manual_lock { " (manually locked)" } else { "" }
                );
                for slot in &app.lock {
                    println!("      lock   {}", describe(slot));
                }
                for slot in &app.unlock {
                    println!("      unlock {}", describe(slot));
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver, CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
