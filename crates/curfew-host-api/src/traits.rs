//! Collaborator traits

use async_trait::async_trait;
use curfew_api::RestrictionChange;
use curfew_util::PackageId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::HostCapabilities;

/// Errors from collaborator operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Enumeration failed: {0}")]
    EnumerationFailed(String),

    #[error("Notification failed: {0}")]
    NotificationFailed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Installed application as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAppInfo {
    pub package_id: PackageId,
    pub display_name: String,
    /// Opaque icon handle, interpreted by the UI
    pub icon_ref: Option<String>,
    pub is_system_app: bool,
}

impl RawAppInfo {
    pub fn new(package_id: impl Into<PackageId>, display_name: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            display_name: display_name.into(),
            icon_ref: None,
            is_system_app: false,
        }
    }
}

/// Lists the applications installed on the device
#[async_trait]
pub trait AppEnumerator: Send + Sync {
    /// An empty list means nothing is installed. On failure the scheduler
    /// keeps serving its previous registry.
    async fn list_installed_applications(&self) -> HostResult<Vec<RawAppInfo>>;
}

/// Receives the restriction state the scheduler decides on
#[async_trait]
pub trait EnforcementAgent: Send + Sync {
    /// Permissions currently held by the agent
    fn capabilities(&self) -> HostCapabilities;

    /// Deliver state for the changed applications only. Best-effort: the
    /// scheduler does not roll back its own state when delivery fails.
    async fn notify_restrictions(&self, changes: &[RestrictionChange]) -> HostResult<()>;

    /// Optional: check if the agent is healthy
    fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_app_defaults() {
        let app = RawAppInfo::new("org.example.Game", "Game");
        assert_eq!(app.package_id.as_str(), "org.example.Game");
        assert!(!app.is_system_app);
        assert!(app.icon_ref.is_none());
    }

    #[test]
    fn host_error_display() {
        let err = HostError::EnumerationFailed("no readable directories".into());
        assert_eq!(err.to_string(), "Enumeration failed: no readable directories");
    }
}
