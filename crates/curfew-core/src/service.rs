//! Scheduler service
//!
//! Owns the registry snapshot and is the single place that mutates it.
//! Readers clone an `Arc` of the current snapshot under a briefly held
//! read lock; every mutation (rebuild, edit, reconciliation tick) runs
//! under one async write lock and publishes a new snapshot when done.
//! Enforcement agent notifications are sent after the write lock is
//! released.

use chrono::{DateTime, Local};
use curfew_api::{AppPage, ManagedApp, RestrictionChange, Schedule, ScheduleType, TimeRange};
use curfew_config::{AppSeed, Policy, SlotSpec};
use curfew_host_api::{AppEnumerator, EnforcementAgent, HostCapabilities, RawAppInfo};
use curfew_store::{AuditEvent, AuditEventType, Store};
use curfew_util::{CurfewError, CurfewResult, MonotonicInstant, PackageId, TimeRangeId};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

use crate::{
    CoreEvent, RegistryCache, build_schedules_from_slots, diff_restrictions, replace_slots,
    should_app_be_locked, slots_from_specs, slots_of, validate_slots,
};

/// Source of local wall-clock time
pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Tunables for the scheduler service
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub cache_ttl: Duration,
    pub page_size: usize,
    pub distractive: HashSet<PackageId>,
}

impl SchedulerSettings {
    pub fn from_policy(policy: &Policy) -> Self {
        Self {
            cache_ttl: policy.service.cache_ttl,
            page_size: policy.service.page_size,
            distractive: policy.distractive.clone(),
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from_policy(&Policy::default())
    }
}

/// What one reconciliation tick did
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// False when the agent lacks the permissions to enforce anything
    pub permitted: bool,
    pub changes: Vec<RestrictionChange>,
    pub skipped: usize,
}

/// The scheduler service
pub struct SchedulerService {
    settings: SchedulerSettings,
    store: Arc<dyn Store>,
    enumerator: Arc<dyn AppEnumerator>,
    agent: Arc<dyn EnforcementAgent>,
    clock: Clock,
    published: RwLock<Arc<RegistryCache>>,
    write_lock: Mutex<()>,
    events: broadcast::Sender<CoreEvent>,
}

impl SchedulerService {
    pub fn new(
        settings: SchedulerSettings,
        store: Arc<dyn Store>,
        enumerator: Arc<dyn AppEnumerator>,
        agent: Arc<dyn EnforcementAgent>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        info!(
            cache_ttl_secs = settings.cache_ttl.as_secs(),
            page_size = settings.page_size,
            distractive = settings.distractive.len(),
            "Scheduler service initialized"
        );

        Self {
            settings,
            store,
            enumerator,
            agent,
            clock: Arc::new(curfew_util::now),
            published: RwLock::new(Arc::new(RegistryCache::empty())),
            write_lock: Mutex::new(()),
            events,
        }
    }

    /// Replace the wall-clock source
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Local> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn capabilities(&self) -> HostCapabilities {
        self.agent.capabilities()
    }

    /// Subscribe to core events
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Current snapshot, without triggering a refresh
    pub fn snapshot(&self) -> Arc<RegistryCache> {
        let guard = match self.published.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(&guard)
    }

    fn now(&self) -> DateTime<Local> {
        (self.clock)()
    }

    fn publish(&self, cache: Arc<RegistryCache>) {
        let mut guard = match self.published.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = cache;
    }

    fn emit(&self, event: CoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn audit(&self, event: AuditEventType) {
        if let Err(e) = self.store.append_audit(AuditEvent::new(event)) {
            warn!(error = %e, "Failed to append audit event");
        }
    }

    // Registry reads

    /// Page `cursor` (zero-based) of the sorted application list
    pub async fn get_page(&self, cursor: usize) -> AppPage {
        let snapshot = self.ensure_fresh(self.now()).await;
        snapshot.page(cursor, self.settings.page_size)
    }

    /// Search display names and package IDs over the whole registry
    pub async fn search(&self, query: &str) -> Vec<ManagedApp> {
        self.ensure_fresh(self.now()).await.search(query)
    }

    pub async fn get_app(&self, package_id: &PackageId) -> Option<ManagedApp> {
        self.ensure_fresh(self.now()).await.get(package_id).cloned()
    }

    /// Rebuild the registry now, regardless of TTL.
    ///
    /// On enumeration failure the previous registry stays in place, marked
    /// stale, and the error is returned.
    pub async fn force_refresh(&self) -> CurfewResult<usize> {
        let now = self.now();
        let changes = {
            let _guard = self.write_lock.lock().await;
            self.rebuild_locked(now).await?
        };
        self.deliver(changes).await;
        Ok(self.snapshot().len())
    }

    async fn ensure_fresh(&self, now: DateTime<Local>) -> Arc<RegistryCache> {
        let snapshot = self.snapshot();
        if !snapshot.is_expired(MonotonicInstant::now(), self.settings.cache_ttl) {
            return snapshot;
        }

        let changes = {
            let _guard = self.write_lock.lock().await;

            // Another caller may have rebuilt while we waited
            let current = self.snapshot();
            if !current.is_expired(MonotonicInstant::now(), self.settings.cache_ttl) {
                return current;
            }

            self.rebuild_locked(now).await.unwrap_or_default()
        };

        self.deliver(changes).await;
        self.snapshot()
    }

    /// Caller must hold `write_lock`.
    async fn rebuild_locked(&self, now: DateTime<Local>) -> CurfewResult<Vec<RestrictionChange>> {
        let previous = self.snapshot();

        let raw = match self.enumerator.list_installed_applications().await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    error = %e,
                    cached = previous.len(),
                    "Application enumeration failed, serving previous registry"
                );
                let mut stale = (*previous).clone();
                stale.mark_stale(MonotonicInstant::now());
                self.publish(Arc::new(stale));
                self.audit(AuditEventType::EnumerationFailed {
                    message: e.to_string(),
                });
                self.emit(CoreEvent::RegistryStale {
                    reason: e.to_string(),
                });
                return Err(CurfewError::enumeration(e.to_string()));
            }
        };

        let mut seen = HashSet::new();
        let mut apps = Vec::with_capacity(raw.len());
        let mut changes = Vec::new();

        for info in raw {
            if !seen.insert(info.package_id.clone()) {
                continue;
            }

            let was_restricted = previous
                .get(&info.package_id)
                .is_some_and(|a| a.currently_restricted);
            let mut app = self.load_app(info, &previous);
            app.currently_restricted = was_restricted;

            match should_app_be_locked(&app, &now) {
                Ok(restricted) => app.currently_restricted = restricted,
                Err(e) => warn!(package_id = %app.package_id, error = %e, "Keeping previous restriction state"),
            }

            if app.currently_restricted != was_restricted {
                changes.push(RestrictionChange::for_app(&app));
            }
            apps.push(app);
        }

        let app_count = apps.len();
        self.publish(Arc::new(RegistryCache::build(apps, MonotonicInstant::now())));

        info!(app_count, changed = changes.len(), "Application registry rebuilt");
        self.audit(AuditEventType::RegistryRebuilt { app_count });
        self.emit(CoreEvent::RegistryRebuilt { app_count });

        Ok(changes)
    }

    fn load_app(&self, info: RawAppInfo, previous: &RegistryCache) -> ManagedApp {
        let cached = previous.get(&info.package_id);

        let schedules = self.store.load_schedules(&info.package_id).unwrap_or_else(|e| {
            warn!(package_id = %info.package_id, error = %e, "Failed to load schedules");
            cached.map(|a| a.schedules.clone()).unwrap_or_default()
        });
        let manually_locked = self.store.load_manual_lock(&info.package_id).unwrap_or_else(|e| {
            warn!(package_id = %info.package_id, error = %e, "Failed to load manual lock");
            cached.is_some_and(|a| a.manually_locked)
        });

        ManagedApp {
            is_flagged_distractive: self.settings.distractive.contains(&info.package_id),
            package_id: info.package_id,
            display_name: info.display_name,
            icon_ref: info.icon_ref,
            is_system_app: info.is_system_app,
            manually_locked,
            schedules,
            currently_restricted: false,
        }
    }

    // Edits

    /// Add a slot to the app's schedule of `kind`, creating the schedule
    /// if needed.
    pub async fn add_time_slot(
        &self,
        package_id: &PackageId,
        kind: ScheduleType,
        slot: SlotSpec,
    ) -> CurfewResult<ManagedApp> {
        self.commit_edit(package_id, |app| {
            let slots = crate::add_time_slot(
                &slots_of(&app.schedules, kind),
                slot.start.hour,
                slot.start.minute,
                slot.end.hour,
                slot.end.minute,
                slot.days,
            )?;
            self.save_schedules(app, replace_slots(&app.schedules, kind, slots))
        })
        .await
    }

    /// Remove one slot; an unknown ID changes nothing.
    pub async fn remove_time_slot(
        &self,
        package_id: &PackageId,
        kind: ScheduleType,
        range_id: TimeRangeId,
    ) -> CurfewResult<ManagedApp> {
        self.commit_edit(package_id, |app| {
            let slots = slots_of(&app.schedules, kind);
            let remaining = crate::remove_time_slot(&slots, range_id);
            if remaining.len() == slots.len() {
                return Ok(app.clone());
            }
            self.save_schedules(app, replace_slots(&app.schedules, kind, remaining))
        })
        .await
    }

    /// Replace both slot lists at once, keeping schedule identities.
    ///
    /// Every slot must cover at least one day and hold valid times;
    /// otherwise nothing is saved.
    pub async fn set_slots(
        &self,
        package_id: &PackageId,
        lock_slots: Vec<TimeRange>,
        unlock_slots: Vec<TimeRange>,
    ) -> CurfewResult<ManagedApp> {
        validate_slots(&lock_slots)?;
        validate_slots(&unlock_slots)?;

        self.commit_edit(package_id, |app| {
            let schedules = replace_slots(&app.schedules, ScheduleType::Lock, lock_slots);
            let schedules = replace_slots(&schedules, ScheduleType::Unlock, unlock_slots);
            self.save_schedules(app, schedules)
        })
        .await
    }

    /// Enable or disable every schedule of the app at once.
    ///
    /// Fails with [`CurfewError::PartialUpdateRejected`] if the new state
    /// cannot be persisted; nothing changes in that case.
    pub async fn set_schedules_enabled(
        &self,
        package_id: &PackageId,
        enabled: bool,
    ) -> CurfewResult<ManagedApp> {
        self.commit_edit(package_id, |app| self.apply_enabled(app, enabled))
            .await
    }

    /// Flip the app's aggregate schedules-enabled state.
    pub async fn toggle_schedules_enabled(&self, package_id: &PackageId) -> CurfewResult<ManagedApp> {
        self.commit_edit(package_id, |app| {
            self.apply_enabled(app, !app.schedules_enabled())
        })
        .await
    }

    /// Set the legacy manual lock flag.
    pub async fn set_manual_lock(&self, package_id: &PackageId, locked: bool) -> CurfewResult<ManagedApp> {
        self.commit_edit(package_id, |app| {
            self.store
                .save_manual_lock(&app.package_id, locked)
                .map_err(|e| CurfewError::store(e.to_string()))?;
            self.audit(AuditEventType::ManualLockChanged {
                package_id: app.package_id.clone(),
                locked,
            });
            Ok(ManagedApp {
                manually_locked: locked,
                ..app.clone()
            })
        })
        .await
    }

    fn apply_enabled(&self, app: &ManagedApp, enabled: bool) -> CurfewResult<ManagedApp> {
        let updated = crate::set_schedules_enabled(app, enabled);

        self.store
            .save_schedules(&app.package_id, &updated.schedules)
            .map_err(|e| {
                CurfewError::partial_update(format!(
                    "schedules of {} could not be saved: {}",
                    app.package_id, e
                ))
            })?;

        self.audit(AuditEventType::SchedulesToggled {
            package_id: app.package_id.clone(),
            enabled,
        });
        Ok(updated)
    }

    fn save_schedules(&self, app: &ManagedApp, schedules: Vec<Schedule>) -> CurfewResult<ManagedApp> {
        self.store
            .save_schedules(&app.package_id, &schedules)
            .map_err(|e| CurfewError::store(e.to_string()))?;

        self.audit(AuditEventType::SchedulesSaved {
            package_id: app.package_id.clone(),
            schedule_count: schedules.len(),
        });

        Ok(ManagedApp {
            schedules,
            ..app.clone()
        })
    }

    /// Run `edit` against the cached app under the write lock, then
    /// re-evaluate it immediately so the agent does not wait for the next
    /// tick. `edit` persists its own changes; if it fails, the snapshot is
    /// left untouched.
    async fn commit_edit<F>(&self, package_id: &PackageId, edit: F) -> CurfewResult<ManagedApp>
    where
        F: FnOnce(&ManagedApp) -> CurfewResult<ManagedApp>,
    {
        let now = self.now();
        self.ensure_fresh(now).await;

        let (updated, change) = {
            let _guard = self.write_lock.lock().await;
            let mut snapshot = self.snapshot();

            let current = snapshot
                .get(package_id)
                .ok_or_else(|| CurfewError::AppNotFound(package_id.clone()))?;
            let was_restricted = current.currently_restricted;

            let mut updated = edit(current)?;
            match should_app_be_locked(&updated, &now) {
                Ok(restricted) => updated.currently_restricted = restricted,
                Err(e) => warn!(package_id = %package_id, error = %e, "Keeping previous restriction state"),
            }

            Arc::make_mut(&mut snapshot).replace(updated.clone());
            self.publish(snapshot);

            debug!(
                package_id = %package_id,
                schedules_enabled = updated.schedules_enabled(),
                restricted = updated.currently_restricted,
                "Application updated"
            );
            self.emit(CoreEvent::SchedulesUpdated {
                package_id: package_id.clone(),
                schedules_enabled: updated.schedules_enabled(),
            });

            let change = (updated.currently_restricted != was_restricted)
                .then(|| RestrictionChange::for_app(&updated));
            (updated, change)
        };

        self.deliver(change.into_iter().collect()).await;
        Ok(updated)
    }

    // Reconciliation

    /// One reconciliation tick at the current time
    pub async fn reconcile(&self) -> TickReport {
        self.reconcile_at(self.now()).await
    }

    /// Re-evaluate every app with enabled schedules at `now` and push only
    /// the ones whose restriction state changed.
    ///
    /// Nothing happens while the agent lacks the permissions to enforce.
    pub async fn reconcile_at(&self, now: DateTime<Local>) -> TickReport {
        let capabilities = self.agent.capabilities();
        if !capabilities.scheduler_permitted() {
            debug!(?capabilities, "Reconciliation skipped, missing permissions");
            return TickReport::default();
        }

        self.ensure_fresh(now).await;

        let (changes, skipped) = {
            let _guard = self.write_lock.lock().await;
            let mut snapshot = self.snapshot();

            let outcome = diff_restrictions(snapshot.sorted_full_list(), &now);
            let skipped = outcome.skipped.len();
            if outcome.changed.is_empty() {
                return TickReport {
                    permitted: true,
                    changes: Vec::new(),
                    skipped,
                };
            }

            let changes: Vec<_> = outcome.changed.iter().map(RestrictionChange::for_app).collect();
            let cache = Arc::make_mut(&mut snapshot);
            for app in outcome.changed {
                cache.replace(app);
            }
            self.publish(snapshot);
            (changes, skipped)
        };

        self.deliver(changes.clone()).await;

        TickReport {
            permitted: true,
            changes,
            skipped,
        }
    }

    async fn deliver(&self, changes: Vec<RestrictionChange>) {
        if changes.is_empty() {
            return;
        }

        for change in &changes {
            info!(
                package_id = %change.package_id,
                restricted = change.restricted,
                "Restriction state changed"
            );
            self.audit(AuditEventType::RestrictionChanged {
                package_id: change.package_id.clone(),
                restricted: change.restricted,
            });
            self.emit(CoreEvent::RestrictionChanged {
                package_id: change.package_id.clone(),
                restricted: change.restricted,
                schedules_enabled: change.schedules_enabled,
            });
        }

        if let Err(e) = self.agent.notify_restrictions(&changes).await {
            warn!(error = %e, count = changes.len(), "Enforcement agent did not accept changes");
        }
    }

    // Seeding

    /// Write configured schedules for apps the store knows nothing about.
    ///
    /// An app counts as unknown when it has no stored schedules and no
    /// manual lock. Returns how many apps were seeded.
    pub fn seed(&self, seeds: &[AppSeed]) -> CurfewResult<usize> {
        let mut seeded = 0;

        for seed in seeds {
            let store_err = |e: curfew_store::StoreError| CurfewError::store(e.to_string());

            let has_schedules = !self.store.load_schedules(&seed.package_id).map_err(store_err)?.is_empty();
            let has_lock = self.store.load_manual_lock(&seed.package_id).map_err(store_err)?;
            if has_schedules || has_lock {
                debug!(package_id = %seed.package_id, "Stored settings found, not seeding");
                continue;
            }

            if seed.has_slots() {
                let lock = slots_from_specs(&seed.lock)?;
                let unlock = slots_from_specs(&seed.unlock)?;
                let schedules = build_schedules_from_slots(&lock, &unlock);
                self.store
                    .save_schedules(&seed.package_id, &schedules)
                    .map_err(store_err)?;
                self.audit(AuditEventType::SchedulesSaved {
                    package_id: seed.package_id.clone(),
                    schedule_count: schedules.len(),
                });
            }

            if seed.manual_lock {
                self.store
                    .save_manual_lock(&seed.package_id, true)
                    .map_err(store_err)?;
            }

            if seed.has_slots() || seed.manual_lock {
                info!(package_id = %seed.package_id, "Seeded application from configuration");
                seeded += 1;
            }
        }

        Ok(seeded)
    }
}
