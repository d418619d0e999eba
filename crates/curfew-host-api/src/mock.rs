//! Mock collaborators for testing

use async_trait::async_trait;
use curfew_api::RestrictionChange;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::{AppEnumerator, EnforcementAgent, HostCapabilities, HostError, HostResult, RawAppInfo};

/// Mock enumerator returning a configurable application list
pub struct MockEnumerator {
    apps: Arc<Mutex<Vec<RawAppInfo>>>,
    calls: AtomicUsize,

    /// Configure enumeration to fail
    pub fail: Arc<Mutex<bool>>,
}

impl MockEnumerator {
    pub fn new(apps: Vec<RawAppInfo>) -> Self {
        Self {
            apps: Arc::new(Mutex::new(apps)),
            calls: AtomicUsize::new(0),
            fail: Arc::new(Mutex::new(false)),
        }
    }

    /// Replace the installed application list
    pub fn set_apps(&self, apps: Vec<RawAppInfo>) {
        *self.apps.lock().unwrap() = apps;
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    /// Number of enumeration calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockEnumerator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl AppEnumerator for MockEnumerator {
    async fn list_installed_applications(&self) -> HostResult<Vec<RawAppInfo>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if *self.fail.lock().unwrap() {
            return Err(HostError::EnumerationFailed("Mock enumeration failure".into()));
        }

        Ok(self.apps.lock().unwrap().clone())
    }
}

/// Mock enforcement agent recording every notification batch
pub struct MockAgent {
    capabilities: Arc<Mutex<HostCapabilities>>,
    batches: Arc<Mutex<Vec<Vec<RestrictionChange>>>>,

    /// Configure notification delivery to fail
    pub fail_notify: Arc<Mutex<bool>>,
}

impl MockAgent {
    pub fn new() -> Self {
        Self {
            capabilities: Arc::new(Mutex::new(HostCapabilities::full())),
            batches: Arc::new(Mutex::new(Vec::new())),
            fail_notify: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_capabilities(self, caps: HostCapabilities) -> Self {
        *self.capabilities.lock().unwrap() = caps;
        self
    }

    /// Simulate a permission grant or revocation
    pub fn set_capabilities(&self, caps: HostCapabilities) {
        *self.capabilities.lock().unwrap() = caps;
    }

    pub fn set_fail_notify(&self, fail: bool) {
        *self.fail_notify.lock().unwrap() = fail;
    }

    /// Every batch received, in delivery order (failed deliveries included)
    pub fn batches(&self) -> Vec<Vec<RestrictionChange>> {
        self.batches.lock().unwrap().clone()
    }

    /// Flattened list of every change received
    pub fn changes(&self) -> Vec<RestrictionChange> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }
}

impl Default for MockAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnforcementAgent for MockAgent {
    fn capabilities(&self) -> HostCapabilities {
        *self.capabilities.lock().unwrap()
    }

    async fn notify_restrictions(&self, changes: &[RestrictionChange]) -> HostResult<()> {
        self.batches.lock().unwrap().push(changes.to_vec());

        if *self.fail_notify.lock().unwrap() {
            return Err(HostError::NotificationFailed("Mock delivery failure".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curfew_util::PackageId;

    #[tokio::test]
    async fn mock_enumerator_counts_and_fails() {
        let enumerator = MockEnumerator::new(vec![RawAppInfo::new("org.example.Game", "Game")]);

        let apps = enumerator.list_installed_applications().await.unwrap();
        assert_eq!(apps.len(), 1);

        enumerator.set_fail(true);
        assert!(enumerator.list_installed_applications().await.is_err());
        assert_eq!(enumerator.call_count(), 2);
    }

    #[tokio::test]
    async fn mock_agent_records_batches() {
        let agent = MockAgent::new();
        let change = RestrictionChange {
            package_id: PackageId::new("org.example.Game"),
            restricted: true,
            schedules_enabled: true,
        };

        agent.notify_restrictions(&[change.clone()]).await.unwrap();

        agent.set_fail_notify(true);
        assert!(agent.notify_restrictions(&[change.clone()]).await.is_err());

        assert_eq!(agent.batches().len(), 2);
        assert_eq!(agent.changes(), vec![change.clone(), change]);
    }

    #[test]
    fn mock_agent_capabilities_toggle() {
        let agent = MockAgent::new().with_capabilities(HostCapabilities::none());
        assert!(!agent.capabilities().scheduler_permitted());

        agent.set_capabilities(HostCapabilities::full());
        assert!(agent.capabilities().scheduler_permitted());
    }
}
