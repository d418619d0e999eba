//! Store trait definitions

use curfew_api::Schedule;
use curfew_util::PackageId;

use crate::{AuditEvent, StoreResult};

/// Main store trait
pub trait Store: Send + Sync {
    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Schedules

    /// Load all schedules for an application (empty if none saved)
    fn load_schedules(&self, package_id: &PackageId) -> StoreResult<Vec<Schedule>>;

    /// Replace all schedules for an application. Either the whole list is
    /// stored or nothing changes.
    fn save_schedules(&self, package_id: &PackageId, schedules: &[Schedule]) -> StoreResult<()>;

    // Legacy manual lock

    /// Get the manual lock flag for an application (false if never set)
    fn load_manual_lock(&self, package_id: &PackageId) -> StoreResult<bool>;

    /// Set the manual lock flag for an application
    fn save_manual_lock(&self, package_id: &PackageId, locked: bool) -> StoreResult<()>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
