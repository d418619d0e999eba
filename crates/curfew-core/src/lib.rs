//! Core scheduler for curfew
//!
//! This crate decides, at any instant, whether each managed application
//! should be restricted:
//! - Time window evaluation (LOCK and UNLOCK schedules, midnight crossing)
//! - Schedule building from user-entered time slots
//! - Application registry cache (sorted, paginated, TTL-bound)
//! - Periodic reconciliation propagating only changed restriction states

mod builder;
mod evaluator;
mod events;
mod reconciler;
mod registry;
mod service;

pub use builder::*;
pub use evaluator::*;
pub use events::*;
pub use reconciler::*;
pub use registry::*;
pub use service::*;
