//! Collaborator interfaces for curfew
//!
//! This crate defines the narrow interfaces between the scheduler core and
//! the platform: who enumerates installed applications, and who enforces
//! the restriction state the scheduler decides on. It contains no platform
//! code itself.

mod capabilities;
mod mock;
mod traits;

pub use capabilities::*;
pub use mock::*;
pub use traits::*;
