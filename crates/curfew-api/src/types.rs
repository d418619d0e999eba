//! Managed application views shared with callers and collaborators

use curfew_util::PackageId;
use serde::{Deserialize, Serialize};

use crate::{Schedule, ScheduleType};

/// An application under schedule management
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedApp {
    pub package_id: PackageId,
    pub display_name: String,
    pub icon_ref: Option<String>,
    pub is_system_app: bool,
    pub is_flagged_distractive: bool,
    /// Legacy on/off flag, consulted only when no schedule is enabled
    #[serde(default)]
    pub manually_locked: bool,
    pub schedules: Vec<Schedule>,
    /// Last evaluator output; re-derivable from `schedules` and the clock
    pub currently_restricted: bool,
}

impl ManagedApp {
    /// True iff at least one schedule is enabled
    pub fn schedules_enabled(&self) -> bool {
        self.schedules.iter().any(|s| s.enabled)
    }

    pub fn schedule(&self, kind: ScheduleType) -> Option<&Schedule> {
        self.schedules.iter().find(|s| s.kind == kind)
    }

    /// Case-insensitive substring match on display name or package ID
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.display_name.to_lowercase().contains(&query)
            || self.package_id.as_str().to_lowercase().contains(&query)
    }
}

/// One page of the sorted application list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppPage {
    /// Zero-based page index this page was served for
    pub cursor: usize,
    pub apps: Vec<ManagedApp>,
    pub has_more: bool,
    /// Served from a snapshot that could not be refreshed
    pub stale: bool,
}

/// Desired restriction state for one application, sent to the enforcement agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionChange {
    pub package_id: PackageId,
    pub restricted: bool,
    pub schedules_enabled: bool,
}

impl RestrictionChange {
    pub fn for_app(app: &ManagedApp) -> Self {
        Self {
            package_id: app.package_id.clone(),
            restricted: app.currently_restricted,
            schedules_enabled: app.schedules_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(name: &str, package: &str) -> ManagedApp {
        ManagedApp {
            package_id: PackageId::new(package),
            display_name: name.into(),
            icon_ref: None,
            is_system_app: false,
            is_flagged_distractive: false,
            manually_locked: false,
            schedules: vec![],
            currently_restricted: false,
        }
    }

    #[test]
    fn schedules_enabled_is_any_enabled() {
        let mut app = app("Chat", "org.example.Chat");
        assert!(!app.schedules_enabled());

        let mut lock = Schedule::new(ScheduleType::Lock, vec![]);
        lock.enabled = false;
        app.schedules.push(lock);
        assert!(!app.schedules_enabled());

        app.schedules.push(Schedule::new(ScheduleType::Unlock, vec![]));
        assert!(app.schedules_enabled());
        assert!(app.schedule(ScheduleType::Unlock).is_some());
    }

    #[test]
    fn query_matching_is_case_insensitive() {
        let app = app("Firefox Web Browser", "org.mozilla.firefox");
        assert!(app.matches_query("firefox"));
        assert!(app.matches_query("WEB"));
        assert!(app.matches_query("mozilla"));
        assert!(app.matches_query("  "));
        assert!(!app.matches_query("steam"));
    }

    #[test]
    fn restriction_change_reflects_app() {
        let mut app = app("Game", "org.example.Game");
        app.currently_restricted = true;
        app.schedules.push(Schedule::new(ScheduleType::Lock, vec![]));

        let change = RestrictionChange::for_app(&app);
        assert!(change.restricted);
        assert!(change.schedules_enabled);

        let json = serde_json::to_string(&change).unwrap();
        assert!(json.contains("\"package_id\":\"org.example.Game\""));
    }
}
