//! Error types for curfew

use thiserror::Error;

use crate::PackageId;

/// Core error type for curfew operations
#[derive(Debug, Error)]
pub enum CurfewError {
    #[error("Invalid time value: {0}")]
    InvalidTimeValue(String),

    #[error("No days selected for time slot")]
    NoDaysSelected,

    #[error("Update rejected, nothing was changed: {0}")]
    PartialUpdateRejected(String),

    #[error("Application enumeration unavailable: {0}")]
    EnumerationUnavailable(String),

    #[error("Evaluation skipped for {package_id}: {reason}")]
    EvaluatorSkipped {
        package_id: PackageId,
        reason: String,
    },

    #[error("Application not found: {0}")]
    AppNotFound(PackageId),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Host error: {0}")]
    HostError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CurfewError {
    pub fn invalid_time(msg: impl Into<String>) -> Self {
        Self::InvalidTimeValue(msg.into())
    }

    pub fn partial_update(msg: impl Into<String>) -> Self {
        Self::PartialUpdateRejected(msg.into())
    }

    pub fn enumeration(msg: impl Into<String>) -> Self {
        Self::EnumerationUnavailable(msg.into())
    }

    pub fn skipped(package_id: PackageId, reason: impl Into<String>) -> Self {
        Self::EvaluatorSkipped {
            package_id,
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }

    pub fn host(msg: impl Into<String>) -> Self {
        Self::HostError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Validation errors are returned to the caller and leave state untouched
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidTimeValue(_) | Self::NoDaysSelected)
    }
}

pub type CurfewResult<T> = std::result::Result<T, CurfewError>;
