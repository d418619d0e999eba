//! Default paths for curfew components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/curfew/config.toml` or `~/.config/curfew/config.toml`
//! - Data: `$XDG_DATA_HOME/curfew` or `~/.local/share/curfew`
//! - State file: `$XDG_STATE_HOME/curfew/restrictions.json` or `~/.local/state/curfew/restrictions.json`

use std::path::PathBuf;

/// Environment variable for overriding the data directory
pub const CURFEW_DATA_DIR_ENV: &str = "CURFEW_DATA_DIR";

/// Application subdirectory name
const APP_DIR: &str = "curfew";

/// Restriction state filename within the state directory
const STATE_FILENAME: &str = "restrictions.json";

fn xdg_dir(var: &str, home_fallback: &[&str], last_resort: &str) -> PathBuf {
    if let Ok(dir) = std::env::var(var) {
        return PathBuf::from(dir).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return home_fallback
            .iter()
            .fold(PathBuf::from(home), |path, part| path.join(part))
            .join(APP_DIR);
    }

    PathBuf::from("/tmp").join(APP_DIR).join(last_resort)
}

/// Get the default configuration file path.
pub fn default_config_path() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", &[".config"], "config").join("config.toml")
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$CURFEW_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/curfew` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/curfew` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(CURFEW_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking the CURFEW_DATA_DIR env var.
/// Used for default values in configs where the env var is checked separately.
pub fn data_dir_without_env() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", &[".local", "share"], "data")
}

/// Get the default restriction state file consumed by the enforcement agent.
pub fn default_state_file() -> PathBuf {
    xdg_dir("XDG_STATE_HOME", &[".local", "state"], "state").join(STATE_FILENAME)
}

/// Get the default XDG application directories to enumerate.
///
/// The user's own directory comes first so user entries shadow system ones.
pub fn default_application_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    match std::env::var("XDG_DATA_HOME") {
        Ok(data_home) => dirs.push(PathBuf::from(data_home).join("applications")),
        Err(_) => {
            if let Ok(home) = std::env::var("HOME") {
                dirs.push(
                    PathBuf::from(home)
                        .join(".local")
                        .join("share")
                        .join("applications"),
                );
            }
        }
    }

    let data_dirs = std::env::var("XDG_DATA_DIRS")
        .unwrap_or_else(|_| "/usr/local/share:/usr/share".to_string());
    dirs.extend(
        data_dirs
            .split(':')
            .filter(|d| !d.is_empty())
            .map(|d| PathBuf::from(d).join("applications")),
    );

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_toml_in_app_dir() {
        let path = default_config_path();
        assert!(path.to_string_lossy().contains("curfew"));
        assert_eq!(path.file_name().unwrap(), "config.toml");
    }

    #[test]
    fn data_dir_contains_curfew() {
        let path = data_dir_without_env();
        assert!(path.to_string_lossy().contains("curfew"));
    }

    #[test]
    fn state_file_is_json() {
        let path = default_state_file();
        assert_eq!(path.file_name().unwrap(), "restrictions.json");
    }

    #[test]
    fn application_dirs_end_in_applications() {
        let dirs = default_application_dirs();
        assert!(!dirs.is_empty());
        assert!(dirs.iter().all(|d| d.ends_with("applications")));
    }
}
