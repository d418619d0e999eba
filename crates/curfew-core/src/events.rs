//! Core events emitted by the scheduler

use curfew_util::PackageId;

/// Events emitted by the scheduler service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// Computed restriction state of an application changed
    RestrictionChanged {
        package_id: PackageId,
        restricted: bool,
        schedules_enabled: bool,
    },

    /// Schedules or manual lock of an application were edited
    SchedulesUpdated {
        package_id: PackageId,
        schedules_enabled: bool,
    },

    /// Registry rebuilt from a fresh enumeration
    RegistryRebuilt { app_count: usize },

    /// Enumeration failed; the previous registry is served stale
    RegistryStale { reason: String },
}
