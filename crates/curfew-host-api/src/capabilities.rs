//! Host capabilities model

use serde::{Deserialize, Serialize};

/// Permissions the enforcement side holds. The scheduler runs only when
/// both are granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HostCapabilities {
    /// Can observe which application is in use
    pub can_observe_usage: bool,

    /// Can draw the blocking overlay over a restricted application
    pub can_draw_overlay: bool,
}

impl HostCapabilities {
    /// Both permissions granted
    pub fn full() -> Self {
        Self {
            can_observe_usage: true,
            can_draw_overlay: true,
        }
    }

    /// Neither permission granted
    pub fn none() -> Self {
        Self::default()
    }

    pub fn scheduler_permitted(&self) -> bool {
        self.can_observe_usage && self.can_draw_overlay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_needs_both_permissions() {
        assert!(HostCapabilities::full().scheduler_permitted());
        assert!(!HostCapabilities::none().scheduler_permitted());

        let partial = HostCapabilities {
            can_observe_usage: true,
            can_draw_overlay: false,
        };
        assert!(!partial.scheduler_permitted());
    }
}
