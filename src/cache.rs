//! On-disk cache directory layout: mount lock, metadata snapshot, per-object
//! content files.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use crate::codec;
use crate::error::Ros3fsError;
use crate::fingerprint::fingerprint;
use crate::model::ObjectEntry;

const LOCK_DIR_NAME: &str = "lock";
const METADATA_PREFIX: &str = "ros3fs_meta_data_";
const CONTENT_PREFIX: &str = "ros3fs_cache_file_";

/// Owns `cache_dir`'s on-disk layout for the lifetime of one mount.
pub struct CacheStore {
    cache_dir: PathBuf,
    lock_dir: PathBuf,
    snapshot_path: PathBuf,
    /// Protects the content-file area against the bulk-delete step of a
    /// refresh: fetches hold it shared while creating a file, clear holds
    /// it exclusive.
    content_lock: RwLock<()>,
    /// Per-path single-flight mutexes, handed out (and eventually evicted)
    /// by a `moka` cache rather than a `HashMap` we'd have to prune by hand.
    path_locks: moka::sync::Cache<PathBuf, Arc<Mutex<()>>>,
}

impl CacheStore {
    /// Canonicalizes `cache_dir`, attempts to acquire the mount lock, and
    /// optionally performs the initial `--clear_cache` wipe. Fails with
    /// [`Ros3fsError::MountLocked`] if the lock directory already exists.
    pub async fn acquire(
        cache_dir: &Path,
        endpoint: &str,
        bucket_name: &str,
        clear_cache: bool,
    ) -> Result<Self, Ros3fsError> {
        let cache_dir = tokio::fs::canonicalize(cache_dir).await.map_err(|e| {
            Ros3fsError::StartupFailure(format!(
                "cache_dir {:?} does not exist: {e}",
                cache_dir
            ))
        })?;

        let lock_dir = cache_dir.join(LOCK_DIR_NAME);
        match tokio::fs::create_dir(&lock_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(Ros3fsError::MountLocked { cache_dir });
            }
            Err(e) => {
                return Err(Ros3fsError::CacheIoFailure { path: lock_dir, source: e })
            }
        }
        tracing::info!(path = %lock_dir.display(), "acquired mount lock");

        let snapshot_path =
            cache_dir.join(format!("{METADATA_PREFIX}{}.json", fingerprint(format!("{endpoint}{bucket_name}"))));

        let store = CacheStore {
            cache_dir,
            lock_dir,
            snapshot_path,
            content_lock: RwLock::new(()),
            path_locks: moka::sync::Cache::builder()
                .time_to_idle(Duration::from_secs(300))
                .build(),
        };

        if clear_cache {
            tracing::info!("--clear_cache requested, wiping cache directory");
            let preserve: HashSet<PathBuf> = [store.lock_dir.clone()].into_iter().collect();
            store.clear(&preserve).await?;
        }

        Ok(store)
    }

    /// Removes the mount lock. Logged, non-fatal on failure.
    pub async fn release_lock(&self) {
        if let Err(e) = tokio::fs::remove_dir(&self.lock_dir).await {
            tracing::warn!(
                error = %Ros3fsError::LockReleaseFailed { path: self.lock_dir.clone(), source: e },
                "failed to release mount lock"
            );
        }
    }

    /// Loads the snapshot if present.
    pub async fn load(&self) -> Result<Option<Vec<ObjectEntry>>, Ros3fsError> {
        match tokio::fs::read_to_string(&self.snapshot_path).await {
            Ok(doc) => Ok(Some(codec::decode(&self.snapshot_path, &doc)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(Ros3fsError::CacheIoFailure { path: self.snapshot_path.clone(), source: e })
            }
        }
    }

    /// Writes the snapshot atomically via temp-file-plus-rename.
    pub async fn save(&self, entries: &[ObjectEntry]) -> Result<(), Ros3fsError> {
        let document = codec::encode(entries);
        let cache_dir = self.cache_dir.clone();
        let snapshot_path = self.snapshot_path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), Ros3fsError> {
            let mut tmp = tempfile::NamedTempFile::new_in(&cache_dir).map_err(|e| {
                Ros3fsError::CacheIoFailure { path: cache_dir.clone(), source: e }
            })?;
            use std::io::Write;
            tmp.write_all(document.as_bytes()).map_err(|e| Ros3fsError::CacheIoFailure {
                path: snapshot_path.clone(),
                source: e,
            })?;
            tmp.persist(&snapshot_path).map_err(|e| Ros3fsError::CacheIoFailure {
                path: snapshot_path.clone(),
                source: e.error,
            })?;
            Ok(())
        })
        .await
        .expect("save task panicked")?;
        tracing::debug!(path = %self.snapshot_path.display(), entries = entries.len(), "saved metadata snapshot");
        Ok(())
    }

    /// Path of the content file for logical path `p`.
    pub fn content_path(&self, logical_path: &str) -> PathBuf {
        self.cache_dir.join(format!("{CONTENT_PREFIX}{}", fingerprint(logical_path)))
    }

    fn path_lock(&self, content_path: &Path) -> Arc<Mutex<()>> {
        self.path_locks.get_with(content_path.to_path_buf(), || Arc::new(Mutex::new(())))
    }

    /// Returns `logical_path`'s cached bytes, populating the cache file on
    /// first read. At most one concurrent populate happens per path;
    /// concurrent populates of distinct paths proceed in parallel.
    pub async fn get_contents<F, Fut>(
        &self,
        logical_path: &str,
        fetch: F,
    ) -> Result<Vec<u8>, Ros3fsError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>, Ros3fsError>>,
    {
        let content_path = self.content_path(logical_path);
        let _content_guard = self.content_lock.read().await;
        let per_path = self.path_lock(&content_path);
        let _per_path_guard = per_path.lock().await;

        match tokio::fs::read(&content_path).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Ros3fsError::CacheIoFailure { path: content_path, source: e })
            }
        }

        tracing::debug!(path = logical_path, "cache miss, fetching");
        let bytes = fetch().await?;

        let cache_dir = self.cache_dir.clone();
        let dest = content_path.clone();
        let to_write = bytes.clone();
        tokio::task::spawn_blocking(move || -> Result<(), Ros3fsError> {
            let mut tmp = tempfile::NamedTempFile::new_in(&cache_dir)
                .map_err(|e| Ros3fsError::CacheIoFailure { path: cache_dir.clone(), source: e })?;
            use std::io::Write;
            tmp.write_all(&to_write)
                .map_err(|e| Ros3fsError::CacheIoFailure { path: dest.clone(), source: e })?;
            tmp.persist(&dest)
                .map_err(|e| Ros3fsError::CacheIoFailure { path: dest.clone(), source: e.error })?;
            Ok(())
        })
        .await
        .expect("content write task panicked")?;

        Ok(bytes)
    }

    /// Deletes every entry directly under `cache_dir` not in `preserve`.
    /// The lock directory and snapshot file are always implicitly
    /// preserved in addition to whatever the caller passes. Per-entry I/O
    /// errors are logged and skipped; the first one is still returned so
    /// callers that need "fatal at construction" semantics can propagate
    /// it.
    pub async fn clear(&self, preserve: &HashSet<PathBuf>) -> Result<(), Ros3fsError> {
        let _guard = self.content_lock.write().await;

        let mut preserve = preserve.clone();
        preserve.insert(self.lock_dir.clone());

        let mut entries = tokio::fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| Ros3fsError::CacheIoFailure { path: self.cache_dir.clone(), source: e })?;

        let mut first_error = None;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Ros3fsError::CacheIoFailure { path: self.cache_dir.clone(), source: e })?
        {
            let path = entry.path();
            if preserve.contains(&path) {
                continue;
            }
            let result = if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };
            if let Err(e) = result {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove cache entry during clear");
                first_error.get_or_insert(Ros3fsError::CacheIoFailure { path, source: e });
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Clears everything except the lock and the current snapshot — the
    /// staleness bound a refresh cycle enforces on cached bodies.
    pub async fn clear_stale_content(&self) -> Result<(), Ros3fsError> {
        let preserve: HashSet<PathBuf> = [self.snapshot_path.clone()].into_iter().collect();
        self.clear(&preserve).await
    }
}
