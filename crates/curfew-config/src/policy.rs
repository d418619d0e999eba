//! Validated policy structures

use crate::schema::{RawApp, RawConfig, RawServiceConfig, RawTimeWindow};
use crate::validation::{parse_days, parse_time};
use curfew_util::{
    DaysOfWeek, PackageId, WallClock, default_application_dirs, default_data_dir,
    default_state_file,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Default seconds between reconciliation ticks
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 60;

/// Default registry cache lifetime in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;

/// Default applications per page
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Validated policy ready for use by the scheduler
#[derive(Debug, Clone, Default)]
pub struct Policy {
    /// Service configuration
    pub service: ServiceConfig,

    /// Applications flagged as distractive
    pub distractive: HashSet<PackageId>,

    /// Per-application seeds
    pub apps: Vec<AppSeed>,
}

impl Policy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            service: ServiceConfig::from_raw(raw.service),
            distractive: raw.distractive.into_iter().map(PackageId::new).collect(),
            apps: raw.apps.into_iter().map(AppSeed::from_raw).collect(),
        }
    }

    /// Get the seed for a package
    pub fn get_app(&self, package_id: &PackageId) -> Option<&AppSeed> {
        self.apps.iter().find(|a| &a.package_id == package_id)
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub state_file: PathBuf,
    pub application_dirs: Vec<PathBuf>,
    pub reconcile_interval: Duration,
    pub cache_ttl: Duration,
    pub page_size: usize,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            state_file: raw.state_file.unwrap_or_else(default_state_file),
            application_dirs: raw
                .application_dirs
                .unwrap_or_else(default_application_dirs),
            reconcile_interval: Duration::from_secs(
                raw.reconcile_interval_seconds
                    .unwrap_or(DEFAULT_RECONCILE_INTERVAL_SECS),
            ),
            cache_ttl: Duration::from_secs(
                raw.cache_ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS),
            ),
            page_size: raw.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_raw(RawServiceConfig::default())
    }
}

/// One configured time slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSpec {
    pub days: DaysOfWeek,
    pub start: WallClock,
    pub end: WallClock,
}

/// Seed settings for one application
#[derive(Debug, Clone)]
pub struct AppSeed {
    pub package_id: PackageId,
    pub manual_lock: bool,
    pub lock: Vec<SlotSpec>,
    pub unlock: Vec<SlotSpec>,
}

impl AppSeed {
    fn from_raw(raw: RawApp) -> Self {
        let lock = raw.lock.into_iter().filter_map(convert_window).collect();
        let unlock = raw.unlock.into_iter().filter_map(convert_window).collect();

        Self {
            package_id: PackageId::new(raw.package),
            manual_lock: raw.manual_lock,
            lock,
            unlock,
        }
    }

    pub fn has_slots(&self) -> bool {
        !self.lock.is_empty() || !self.unlock.is_empty()
    }
}

// Windows were validated before conversion; anything unparseable is dropped
fn convert_window(raw: RawTimeWindow) -> Option<SlotSpec> {
    let days = parse_days(&raw.days).ok()?;
    let (start_h, start_m) = parse_time(&raw.start).ok()?;
    let (end_h, end_m) = parse_time(&raw.end).ok()?;

    Some(SlotSpec {
        days,
        start: WallClock::new(start_h, start_m)?,
        end: WallClock::new(end_h, end_m)?,
    })
}
