//! Periodic reconciliation
//!
//! Each tick re-evaluates every application with enabled schedules and
//! reports only those whose restriction state changed.

use chrono::{DateTime, Local};
use curfew_api::ManagedApp;
use curfew_util::CurfewError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::{SchedulerService, should_app_be_locked};

/// Result of one reconciliation pass over a snapshot
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// Copies of apps whose restriction state flipped, carrying the new state
    pub changed: Vec<ManagedApp>,
    /// Apps left as they were because evaluation failed
    pub skipped: Vec<CurfewError>,
}

/// Compare each app's cached state against a fresh evaluation at `now`.
///
/// Apps without an enabled schedule are left alone; their state only moves
/// when they are edited.
pub fn diff_restrictions(apps: &[ManagedApp], now: &DateTime<Local>) -> TickOutcome {
    let mut outcome = TickOutcome::default();

    for app in apps.iter().filter(|a| a.schedules_enabled()) {
        match should_app_be_locked(app, now) {
            Ok(restricted) if restricted != app.currently_restricted => {
                debug!(
                    package_id = %app.package_id,
                    restricted,
                    "Restriction state changed"
                );
                let mut updated = app.clone();
                updated.currently_restricted = restricted;
                outcome.changed.push(updated);
            }
            Ok(_) => {}
            Err(e) => {
                warn!(package_id = %app.package_id, error = %e, "Skipping app in reconciliation");
                outcome.skipped.push(e);
            }
        }
    }

    outcome
}

/// Run [`SchedulerService::reconcile`] every `period` until the handle is
/// aborted or the runtime shuts down.
pub fn spawn_reconciliation_loop(service: Arc<SchedulerService>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            let report = service.reconcile().await;
            if !report.changes.is_empty() || report.skipped > 0 {
                debug!(
                    changed = report.changes.len(),
                    skipped = report.skipped,
                    "Reconciliation tick"
                );
            }
        }
    })
}
