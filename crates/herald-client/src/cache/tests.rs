use herald_core::{Account, Identity, Notification, NotificationType, Scope, StatusRef};
use herald_util_error::BoxedErrorResult;
use tempfile::tempdir;

use super::*;

fn identity() -> Identity {
    Identity::new("109876", "mastodon.example").expect("valid identity")
}

fn notification(id: &str, kind: NotificationType) -> Notification {
    Notification {
        id: id.into(),
        kind,
        created_at: 1_700_000_000u64.into(),
        account: Account {
            id: "7".into(),
            acct: "alice@example.org".into(),
            display_name: "Alice".into(),
        },
        status: Some(StatusRef {
            id: format!("s{id}"),
            url: None,
            content: "<p>hi</p>".into(),
        }),
    }
}

fn snapshot() -> Vec<Notification> {
    vec![
        notification("3", NotificationType::Mention),
        notification("2", NotificationType::Favourite),
        notification("1", NotificationType::Follow),
    ]
}

#[test_log::test(tokio::test)]
async fn memory_read_after_write() -> BoxedErrorResult<()> {
    let cache = InMemoryNotificationCache::new();
    let id = identity();

    assert!(cache.read(Scope::Mentions, &id).await.is_empty());

    cache.write(Scope::Mentions, &id, &snapshot()).await?;

    assert_eq!(cache.read(Scope::Mentions, &id).await, snapshot());
    assert!(cache.read(Scope::Everything, &id).await.is_empty());
    assert_eq!(cache.write_count(), 1);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn memory_injected_failures() -> BoxedErrorResult<()> {
    let cache = InMemoryNotificationCache::new();
    let id = identity();

    cache.write(Scope::Everything, &id, &snapshot()).await?;
    cache.set_fail_reads(true);

    assert!(cache.try_read(Scope::Everything, &id).await.is_err());
    assert!(cache.read(Scope::Everything, &id).await.is_empty());

    cache.set_fail_reads(false);
    cache.set_fail_writes(true);
    assert!(cache.write(Scope::Everything, &id, &[]).await.is_err());
    assert_eq!(cache.read(Scope::Everything, &id).await, snapshot());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn file_read_after_write() -> BoxedErrorResult<()> {
    let dir = tempdir()?;
    let cache = FileNotificationCache::new(dir.path());
    let id = identity();

    cache.write(Scope::Everything, &id, &snapshot()).await?;

    let path = cache.path_for(Scope::Everything, &id);
    assert!(path.starts_with(dir.path()));
    assert!(path.ends_with("109876@mastodon.example/notifications-everything.json"));
    assert_eq!(cache.read(Scope::Everything, &id).await, snapshot());
    assert!(cache.read(Scope::Mentions, &id).await.is_empty());

    // Overwrites, not appends
    let shorter = snapshot()[..1].to_vec();
    cache.write(Scope::Everything, &id, &shorter).await?;
    assert_eq!(cache.read(Scope::Everything, &id).await, shorter);

    // No temp files left behind
    let entries = std::fs::read_dir(dir.path().join(id.to_string()))?.count();
    assert_eq!(entries, 1);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn file_missing_or_corrupted_reads_empty() -> BoxedErrorResult<()> {
    let dir = tempdir()?;
    let cache = FileNotificationCache::new(dir.path());
    let id = identity();

    assert!(cache.try_read(Scope::Mentions, &id).await.is_err());
    assert!(cache.read(Scope::Mentions, &id).await.is_empty());

    let path = cache.path_for(Scope::Mentions, &id);
    std::fs::create_dir_all(path.parent().expect("has parent"))?;
    std::fs::write(&path, b"{ not json")?;

    assert!(matches!(
        cache.try_read(Scope::Mentions, &id).await,
        Err(crate::error::CacheError::Decode { .. })
    ));
    assert!(cache.read(Scope::Mentions, &id).await.is_empty());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn file_clear() -> BoxedErrorResult<()> {
    let dir = tempdir()?;
    let cache = FileNotificationCache::new(dir.path());
    let id = identity();

    assert!(!cache.clear(Scope::Mentions, &id).await?);

    cache.write(Scope::Mentions, &id, &snapshot()).await?;
    assert!(cache.clear(Scope::Mentions, &id).await?);
    assert!(cache.read(Scope::Mentions, &id).await.is_empty());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn file_clear_removes_interrupted_writes() -> BoxedErrorResult<()> {
    let dir = tempdir()?;
    let cache = FileNotificationCache::new(dir.path());
    let id = identity();

    cache.write(Scope::Everything, &id, &snapshot()).await?;
    let path = cache.path_for(Scope::Everything, &id);
    let id_dir = path.parent().expect("has parent").to_owned();

    // Left behind by writes cancelled before the rename
    std::fs::write(id_dir.join("notifications-everything.json.4242-0.tmp"), b"[")?;
    std::fs::write(id_dir.join("notifications-everything.json.4242-1.tmp"), b"")?;
    std::fs::write(id_dir.join("notifications-mentions.json.4242-2.tmp"), b"")?;

    assert!(cache.clear(Scope::Everything, &id).await?);

    let mut left = vec![];
    for entry in std::fs::read_dir(&id_dir)? {
        left.push(entry?.file_name().to_string_lossy().into_owned());
    }
    assert_eq!(left, ["notifications-mentions.json.4242-2.tmp"]);

    // Nothing to clear, stale files are still swept
    std::fs::write(id_dir.join("notifications-everything.json.4242-3.tmp"), b"")?;
    assert!(!cache.clear(Scope::Everything, &id).await?);
    assert_eq!(std::fs::read_dir(&id_dir)?.count(), 1);
    Ok(())
}
