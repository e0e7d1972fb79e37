use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use herald_core::{Identity, Notification, Scope};
use snafu::ensure;

use super::NotificationCache;
use crate::error::{CacheResult, InjectedSnafu};

/// Process-local cache, with switches to simulate a broken store
#[derive(Debug, Default)]
pub struct InMemoryNotificationCache {
    entries: Mutex<HashMap<(Scope, Identity), Vec<Notification>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_count: AtomicUsize,
}

impl InMemoryNotificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    /// Current snapshot, bypassing fault injection
    pub fn get(&self, scope: Scope, identity: &Identity) -> Option<Vec<Notification>> {
        self.entries
            .lock()
            .expect("Locking failed")
            .get(&(scope, identity.clone()))
            .cloned()
    }
}

#[async_trait::async_trait]
impl NotificationCache for InMemoryNotificationCache {
    async fn try_read(&self, scope: Scope, identity: &Identity) -> CacheResult<Vec<Notification>> {
        ensure!(!self.fail_reads.load(Ordering::SeqCst), InjectedSnafu);

        Ok(self.get(scope, identity).unwrap_or_default())
    }

    async fn write(
        &self,
        scope: Scope,
        identity: &Identity,
        notifications: &[Notification],
    ) -> CacheResult<()> {
        ensure!(!self.fail_writes.load(Ordering::SeqCst), InjectedSnafu);

        self.entries
            .lock()
            .expect("Locking failed")
            .insert((scope, identity.clone()), notifications.to_vec());
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
