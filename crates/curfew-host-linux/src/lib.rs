//! Linux collaborators for curfew
//!
//! Provides:
//! - Application enumeration from XDG `.desktop` entries
//! - An enforcement agent that publishes restriction state to a JSON file
//!   for a session-side blocker to act on

mod desktop;
mod state_file;

pub use desktop::*;
pub use state_file::*;
