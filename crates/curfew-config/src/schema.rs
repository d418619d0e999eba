//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Global service settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Package IDs flagged as distractive; always listed first
    #[serde(default)]
    pub distractive: Vec<String>,

    /// Per-application seed schedules
    #[serde(default)]
    pub apps: Vec<RawApp>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the schedule store
    pub data_dir: Option<PathBuf>,

    /// Restriction state file written for the enforcement agent
    pub state_file: Option<PathBuf>,

    /// Directories scanned for `.desktop` application entries
    pub application_dirs: Option<Vec<PathBuf>>,

    /// Seconds between reconciliation ticks
    pub reconcile_interval_seconds: Option<u64>,

    /// Seconds before the application registry must be rebuilt
    pub cache_ttl_seconds: Option<u64>,

    /// Applications per page
    pub page_size: Option<usize>,
}

/// Raw per-application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawApp {
    /// Package ID the settings apply to
    pub package: String,

    /// Legacy manual lock, used when no schedule is enabled
    #[serde(default)]
    pub manual_lock: bool,

    /// Windows during which the application is restricted
    #[serde(default)]
    pub lock: Vec<RawTimeWindow>,

    /// Windows outside of which the application is restricted
    #[serde(default)]
    pub unlock: Vec<RawTimeWindow>,
}

/// Time window
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawTimeWindow {
    /// Days of week: "weekdays", "weekends", "all", or list like ["mon", "tue", "wed"]
    pub days: RawDays,

    /// Start time (HH:MM format)
    pub start: String,

    /// End time (HH:MM format); earlier than start means the window crosses midnight
    pub end: String,
}

/// Days specification
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawDays {
    Preset(String),
    List(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_service_section() {
        let toml_str = r#"
            config_version = 1

            [service]
            reconcile_interval_seconds = 30
            page_size = 10
            application_dirs = ["/usr/share/applications"]
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.service.reconcile_interval_seconds, Some(30));
        assert_eq!(config.service.page_size, Some(10));
        assert!(config.service.cache_ttl_seconds.is_none());
    }

    #[test]
    fn parse_app_windows() {
        let toml_str = r#"
            config_version = 1
            distractive = ["com.valvesoftware.Steam"]

            [[apps]]
            package = "com.valvesoftware.Steam"

            [[apps.lock]]
            days = "weekdays"
            start = "09:00"
            end = "17:00"

            [[apps.unlock]]
            days = ["sat", "sun"]
            start = "10:00"
            end = "20:00"
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.distractive.len(), 1);
        let app = &config.apps[0];
        assert_eq!(app.lock.len(), 1);
        assert_eq!(app.unlock.len(), 1);
        assert!(matches!(app.unlock[0].days, RawDays::List(ref days) if days.len() == 2));
        assert!(!app.manual_lock);
    }
}
