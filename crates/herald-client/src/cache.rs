//! Per-(scope, identity) snapshot of the notification feed
//!
//! The cache only exists so the timeline has something to show before the
//! first fetch completes. It is never authoritative: a failed read is an
//! empty snapshot and a failed write is only logged.
mod file;
mod memory;

use herald_core::{Identity, Notification, Scope};
use herald_util_error::FmtCompact as _;
use tracing::debug;

pub use self::file::FileNotificationCache;
pub use self::memory::InMemoryNotificationCache;
use crate::error::CacheResult;

const LOG_TARGET: &str = "herald::cache";

#[async_trait::async_trait]
pub trait NotificationCache: Send + Sync {
    async fn try_read(&self, scope: Scope, identity: &Identity) -> CacheResult<Vec<Notification>>;

    /// Overwrite the snapshot for `(scope, identity)`
    async fn write(
        &self,
        scope: Scope,
        identity: &Identity,
        notifications: &[Notification],
    ) -> CacheResult<()>;

    /// Like [`Self::try_read`], but any failure reads as an empty snapshot
    async fn read(&self, scope: Scope, identity: &Identity) -> Vec<Notification> {
        match self.try_read(scope, identity).await {
            Ok(notifications) => notifications,
            Err(err) => {
                debug!(
                    target: LOG_TARGET,
                    %scope,
                    %identity,
                    err = %err.fmt_compact(),
                    "No usable notification snapshot"
                );
                vec![]
            }
        }
    }
}

#[cfg(test)]
mod tests;
