//! Shared utilities for curfew
//!
//! This crate provides:
//! - ID types (PackageId, ScheduleId, TimeRangeId)
//! - Time utilities (weekdays, wall-clock times, monotonic time, mock time)
//! - Error types
//! - Default paths for config, data and state files

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
