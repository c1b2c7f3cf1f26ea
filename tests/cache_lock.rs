use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ros3fs::cache::CacheStore;
use ros3fs::model::ObjectEntry;
use tempfile::TempDir;

#[tokio::test]
async fn mount_lock_excludes_a_second_acquire() {
    let dir = TempDir::new().unwrap();
    let first = CacheStore::acquire(dir.path(), "e", "b", false).await.unwrap();

    let err = CacheStore::acquire(dir.path(), "e", "b", false).await.unwrap_err();
    assert!(matches!(err, ros3fs::Ros3fsError::MountLocked { .. }));

    first.release_lock().await;
    // Once released, a fresh acquire succeeds.
    let second = CacheStore::acquire(dir.path(), "e", "b", false).await.unwrap();
    second.release_lock().await;
}

#[tokio::test]
async fn clear_cache_flag_wipes_pre_existing_content_but_keeps_lock() {
    let dir = TempDir::new().unwrap();
    tokio::fs::write(dir.path().join("ros3fs_cache_file_deadbeef"), b"stale").await.unwrap();

    let store = CacheStore::acquire(dir.path(), "e", "b", true).await.unwrap();

    assert!(dir.path().join("lock").is_dir());
    assert!(!dir.path().join("ros3fs_cache_file_deadbeef").exists());
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn post_refresh_staleness_bound_forces_refetch() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(CacheStore::acquire(dir.path(), "e", "b", false).await.unwrap());
    let entries = vec![ObjectEntry { path: "/p.txt".into(), size: 1, mtime_ms: 0 }];
    store.save(&entries).await.unwrap();

    let fetch_calls = Arc::new(AtomicUsize::new(0));
    let fc = fetch_calls.clone();
    let bytes = store
        .get_contents("/p.txt", || {
            let fc = fc.clone();
            async move {
                fc.fetch_add(1, Ordering::SeqCst);
                Ok(b"v1".to_vec())
            }
        })
        .await
        .unwrap();
    assert_eq!(bytes, b"v1");
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 1);

    // Simulate the post-refresh clear: everything but the snapshot goes.
    store.clear_stale_content().await.unwrap();
    assert!(store.load().await.unwrap().is_some());

    let fc = fetch_calls.clone();
    let bytes = store
        .get_contents("/p.txt", || {
            let fc = fc.clone();
            async move {
                fc.fetch_add(1, Ordering::SeqCst);
                Ok(b"v2".to_vec())
            }
        })
        .await
        .unwrap();
    assert_eq!(bytes, b"v2");
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 2);
}
