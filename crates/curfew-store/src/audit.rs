//! Audit event types

use chrono::{DateTime, Local};
use curfew_util::PackageId;
use serde::{Deserialize, Serialize};

/// Types of audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Service started
    ServiceStarted,

    /// Service stopped
    ServiceStopped,

    /// Application registry rebuilt from enumeration
    RegistryRebuilt { app_count: usize },

    /// Enumeration failed; the previous registry is served stale
    EnumerationFailed { message: String },

    /// Schedule list replaced for an application
    SchedulesSaved {
        package_id: PackageId,
        schedule_count: usize,
    },

    /// All schedules of an application enabled or disabled at once
    SchedulesToggled { package_id: PackageId, enabled: bool },

    /// Legacy manual lock changed
    ManualLockChanged { package_id: PackageId, locked: bool },

    /// Computed restriction state changed
    RestrictionChanged {
        package_id: PackageId,
        restricted: bool,
    },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Local>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: curfew_util::now(),
            event,
        }
    }
}
