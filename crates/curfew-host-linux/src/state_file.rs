//! Restriction state file agent
//!
//! Publishes the desired restriction state of every app the scheduler has
//! reported on as a JSON object keyed by package ID. A session-side blocker
//! watches the file and enforces it. Writes go to a temporary file that is
//! renamed into place, so readers never see a partial document.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use curfew_api::RestrictionChange;
use curfew_host_api::{EnforcementAgent, HostCapabilities, HostError, HostResult};
use curfew_util::PackageId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Desired state for one application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionRecord {
    pub restricted: bool,
    pub schedules_enabled: bool,
    pub updated_at: DateTime<Local>,
}

/// Contents of the state file
pub type RestrictionState = BTreeMap<PackageId, RestrictionRecord>;

/// Enforcement agent backed by a JSON state file
pub struct StateFileAgent {
    path: PathBuf,
    // Serializes read-merge-write cycles
    write_lock: Mutex<()>,
}

impl StateFileAgent {
    /// Create the agent, making sure the state directory exists
    pub fn new(path: impl Into<PathBuf>) -> HostResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file contents; a missing file is an empty state.
    pub async fn read_state(&self) -> HostResult<RestrictionState> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| HostError::Internal(format!("corrupt state file: {}", e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RestrictionState::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_state(&self, state: &RestrictionState) -> HostResult<()> {
        let json = serde_json::to_vec_pretty(state)
            .map_err(|e| HostError::Internal(format!("cannot encode state: {}", e)))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl EnforcementAgent for StateFileAgent {
    /// Usage observation belongs to the session-side blocker; overlay
    /// drawing needs a writable state directory.
    fn capabilities(&self) -> HostCapabilities {
        let writable = self
            .path
            .parent()
            .and_then(|dir| std::fs::metadata(dir).ok())
            .is_some_and(|meta| meta.is_dir() && !meta.permissions().readonly());

        HostCapabilities {
            can_observe_usage: true,
            can_draw_overlay: writable,
        }
    }

    async fn notify_restrictions(&self, changes: &[RestrictionChange]) -> HostResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut state = self.read_state().await.unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Discarding unreadable state file");
            RestrictionState::new()
        });

        let now = curfew_util::now();
        for change in changes {
            state.insert(
                change.package_id.clone(),
                RestrictionRecord {
                    restricted: change.restricted,
                    schedules_enabled: change.schedules_enabled,
                    updated_at: now,
                },
            );
        }

        self.write_state(&state).await?;
        debug!(path = %self.path.display(), count = changes.len(), "Restriction state written");
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        self.capabilities().can_draw_overlay
    }
}
