//! Application registry cache
//!
//! Holds every managed application, sorted once per build: distractive
//! applications first, then by display name. Pages are served from this
//! sorted list; the entries handed out so far always form a prefix of it.

use curfew_api::{AppPage, ManagedApp};
use curfew_util::{MonotonicInstant, PackageId};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;

/// Sorted snapshot of managed applications
#[derive(Debug)]
pub struct RegistryCache {
    apps: Vec<ManagedApp>,
    /// Length of the prefix of `apps` already handed out through pages
    loaded: AtomicUsize,
    built_at: Option<MonotonicInstant>,
    stale: bool,
}

impl RegistryCache {
    /// A cache that has never been built; always expired
    pub fn empty() -> Self {
        Self {
            apps: Vec::new(),
            loaded: AtomicUsize::new(0),
            built_at: None,
            stale: false,
        }
    }

    /// Build from freshly enumerated apps. Duplicate package IDs keep
    /// their first occurrence.
    pub fn build(apps: Vec<ManagedApp>, built_at: MonotonicInstant) -> Self {
        let mut seen = std::collections::HashSet::new();
        let mut apps: Vec<ManagedApp> = apps
            .into_iter()
            .filter(|app| seen.insert(app.package_id.clone()))
            .collect();
        apps.sort_by(compare_apps);

        Self {
            apps,
            loaded: AtomicUsize::new(0),
            built_at: Some(built_at),
            stale: false,
        }
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Served from a snapshot that could not be refreshed
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn built_at(&self) -> Option<MonotonicInstant> {
        self.built_at
    }

    /// True once `ttl` has elapsed since the last build (or stale mark)
    pub fn is_expired(&self, now: MonotonicInstant, ttl: Duration) -> bool {
        match self.built_at {
            Some(built_at) => now.saturating_duration_since(built_at) >= ttl,
            None => true,
        }
    }

    /// Keep the current contents after a failed refresh.
    ///
    /// The TTL window restarts at `now` so the next read does not retry
    /// immediately.
    pub fn mark_stale(&mut self, now: MonotonicInstant) {
        self.stale = true;
        self.built_at = Some(now);
    }

    /// The full sorted list
    pub fn sorted_full_list(&self) -> &[ManagedApp] {
        &self.apps
    }

    /// Entries already handed out through pages, in order
    pub fn entries(&self) -> &[ManagedApp] {
        let loaded = self.loaded.load(AtomicOrdering::Acquire).min(self.apps.len());
        &self.apps[..loaded]
    }

    /// Serve page `cursor` (zero-based) of `page_size` entries.
    ///
    /// A cursor past the end yields an empty page with `has_more` false.
    pub fn page(&self, cursor: usize, page_size: usize) -> AppPage {
        let total = self.apps.len();
        let start = cursor.saturating_mul(page_size);

        if page_size == 0 || start >= total {
            return AppPage {
                cursor,
                apps: Vec::new(),
                has_more: false,
                stale: self.stale,
            };
        }

        let end = start.saturating_add(page_size).min(total);
        self.loaded.fetch_max(end, AtomicOrdering::AcqRel);

        AppPage {
            cursor,
            apps: self.apps[start..end].to_vec(),
            has_more: end < total,
            stale: self.stale,
        }
    }

    /// Case-insensitive search over the full list, in sorted order
    pub fn search(&self, query: &str) -> Vec<ManagedApp> {
        self.apps
            .iter()
            .filter(|app| app.matches_query(query))
            .cloned()
            .collect()
    }

    pub fn get(&self, package_id: &PackageId) -> Option<&ManagedApp> {
        self.apps.iter().find(|app| &app.package_id == package_id)
    }

    /// Replace an entry in place. Order is not recomputed until the next
    /// build. Returns false if the package is not cached.
    pub fn replace(&mut self, app: ManagedApp) -> bool {
        match self.apps.iter_mut().find(|a| a.package_id == app.package_id) {
            Some(slot) => {
                *slot = app;
                true
            }
            None => false,
        }
    }
}

impl Clone for RegistryCache {
    fn clone(&self) -> Self {
        Self {
            apps: self.apps.clone(),
            loaded: AtomicUsize::new(self.loaded.load(AtomicOrdering::Acquire)),
            built_at: self.built_at,
            stale: self.stale,
        }
    }
}

impl Default for RegistryCache {
    fn default() -> Self {
        Self::empty()
    }
}

/// Distractive first, then display name ignoring case, then package ID
fn compare_apps(a: &ManagedApp, b: &ManagedApp) -> Ordering {
    b.is_flagged_distractive
        .cmp(&a.is_flagged_distractive)
        .then_with(|| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
        })
        .then_with(|| a.package_id.cmp(&b.package_id))
}
