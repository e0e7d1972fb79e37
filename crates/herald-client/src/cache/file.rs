use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use herald_core::{Identity, Notification, Scope};
use snafu::ResultExt as _;
use tracing::{debug, instrument};

use super::{LOG_TARGET, NotificationCache};
use crate::error::{CacheResult, DecodeSnafu, EncodeSnafu, IoSnafu};

/// JSON snapshots under a root directory
///
/// Layout: `<root>/<account_id>@<domain>/notifications-<scope>.json`
#[derive(Debug)]
pub struct FileNotificationCache {
    root: PathBuf,
    tmp_seq: AtomicU64,
}

impl FileNotificationCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tmp_seq: AtomicU64::new(0),
        }
    }

    pub fn path_for(&self, scope: Scope, identity: &Identity) -> PathBuf {
        self.root
            .join(identity.to_string())
            .join(format!("notifications-{scope}.json"))
    }

    /// Remove the snapshot, returns `false` if there was none
    ///
    /// Temp files of interrupted writes of the same snapshot go too.
    pub async fn clear(&self, scope: Scope, identity: &Identity) -> CacheResult<bool> {
        let path = self.path_for(scope, identity);
        let stale = self.remove_tmp_files(&path).await?;
        if 0 < stale {
            debug!(target: LOG_TARGET, path = %path.display(), stale, "Removed stale temp files");
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err).context(IoSnafu { path }),
        }
    }

    /// Remove `<path>.*.tmp` siblings, returns how many were removed
    async fn remove_tmp_files(&self, path: &Path) -> CacheResult<usize> {
        let (Some(dir), Some(file_name)) = (path.parent(), path.file_name()) else {
            return Ok(0);
        };
        let prefix = format!("{}.", file_name.to_string_lossy());

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err).context(IoSnafu { path: dir }),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await.context(IoSnafu { path: dir })? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(&prefix) || !name.ends_with(".tmp") {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err).context(IoSnafu { path: entry.path() }),
            }
        }
        Ok(removed)
    }

    fn tmp_path_for(&self, path: &Path) -> PathBuf {
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        path.with_extension(format!("json.{}-{seq}.tmp", std::process::id()))
    }
}

#[async_trait::async_trait]
impl NotificationCache for FileNotificationCache {
    async fn try_read(&self, scope: Scope, identity: &Identity) -> CacheResult<Vec<Notification>> {
        let path = self.path_for(scope, identity);
        let bytes = tokio::fs::read(&path)
            .await
            .context(IoSnafu { path: &path })?;

        serde_json::from_slice(&bytes).context(DecodeSnafu { path })
    }

    #[instrument(skip_all, fields(%scope, %identity, count = notifications.len()))]
    async fn write(
        &self,
        scope: Scope,
        identity: &Identity,
        notifications: &[Notification],
    ) -> CacheResult<()> {
        let path = self.path_for(scope, identity);
        let bytes = serde_json::to_vec(notifications).context(EncodeSnafu)?;

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .context(IoSnafu { path: dir })?;
        }

        // Readers must never see a partially written snapshot
        let tmp_path = self.tmp_path_for(&path);
        tokio::fs::write(&tmp_path, bytes)
            .await
            .context(IoSnafu { path: &tmp_path })?;
        if let Err(err) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(err).context(IoSnafu { path });
        }

        debug!(target: LOG_TARGET, path = %path.display(), "Wrote notification snapshot");
        Ok(())
    }
}
