//! Shared types for curfew
//!
//! This crate defines the value types passed between the scheduler core,
//! its collaborators and its callers:
//! - Schedule model (schedule types, time ranges, schedules)
//! - Managed application records and paginated views
//! - Restriction change notifications

mod schedule;
mod types;

pub use schedule::*;
pub use types::*;
