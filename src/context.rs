//! Process-wide lifecycle root. Owns the [`CacheStore`], the object-store
//! client, and the current [`DirectoryTree`]; exposes the three operations
//! the (external) kernel adapter calls.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::cache::CacheStore;
use crate::error::Ros3fsError;
use crate::model::{NodeMetadata, ObjectEntry};
use crate::refresher::MetadataRefresher;
use crate::store::ObjectStoreClient;
use crate::tree::DirectoryTree;

/// Forbids a second live [`Context`] in this process, per `spec.md` §5's
/// "singleton Context" rule — an explicit flag rather than hidden global
/// state, so the rule is visible at the call site instead of buried in a
/// static constructor.
static CONTEXT_ALIVE: AtomicBool = AtomicBool::new(false);

/// Configuration a [`Context`] is built from.
pub struct ContextConfig {
    pub endpoint: String,
    pub bucket_name: String,
    pub cache_dir: PathBuf,
    pub clear_cache: bool,
    pub update_seconds: u64,
}

/// Lifecycle root. Construct with [`Context::init`], dispose with
/// [`Context::shutdown`]; a second `init` while one is alive fails.
pub struct Context {
    cache: Arc<CacheStore>,
    client: Arc<dyn ObjectStoreClient>,
    tree: Arc<RwLock<Arc<DirectoryTree>>>,
    refresher: Option<MetadataRefresher>,
}

impl Context {
    /// Acquires the mount lock, loads or fetches metadata, builds the
    /// initial tree, and spawns the refresher. Any failure is
    /// [`Ros3fsError::StartupFailure`] (or a more specific fatal variant)
    /// and leaves no lock held.
    pub async fn init(
        config: ContextConfig,
        client: Arc<dyn ObjectStoreClient>,
    ) -> Result<Self, Ros3fsError> {
        // Sanity listing: validates credentials/endpoint before we trust
        // anything else about the store.
        client
            .list_all()
            .await
            .map_err(|e| Ros3fsError::StartupFailure(format!("sanity listing failed: {e}")))?;

        // The on-disk mount lock is checked before the in-process singleton
        // flag, and regardless of it, so two Contexts constructed against
        // the SAME cache_dir in the same process still surface
        // `MountLocked` rather than having that outcome masked by the
        // process-wide check below.
        let cache = CacheStore::acquire(
            &config.cache_dir,
            &config.endpoint,
            &config.bucket_name,
            config.clear_cache,
        )
        .await?;

        if CONTEXT_ALIVE
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            cache.release_lock().await;
            return Err(Ros3fsError::StartupFailure(
                "a Context is already alive in this process".to_string(),
            ));
        }

        match Self::init_inner(config, client, cache).await {
            Ok(ctx) => Ok(ctx),
            Err(e) => {
                CONTEXT_ALIVE.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    async fn init_inner(
        config: ContextConfig,
        client: Arc<dyn ObjectStoreClient>,
        cache: CacheStore,
    ) -> Result<Self, Ros3fsError> {
        let cache = Arc::new(cache);

        let entries = Self::initial_entries(&cache, client.as_ref()).await?;
        let tree = Arc::new(RwLock::new(Arc::new(DirectoryTree::build(&entries))));

        let refresher = MetadataRefresher::spawn(
            tree.clone(),
            cache.clone(),
            client.clone(),
            config.update_seconds,
        );

        Ok(Context { cache, client, tree, refresher: Some(refresher) })
    }

    async fn initial_entries(
        cache: &CacheStore,
        client: &dyn ObjectStoreClient,
    ) -> Result<Vec<ObjectEntry>, Ros3fsError> {
        if let Some(entries) = cache.load().await? {
            tracing::info!(entries = entries.len(), "loaded metadata snapshot from disk");
            return Ok(entries);
        }

        tracing::info!("no snapshot on disk, performing full listing");
        let listed = client
            .list_all()
            .await
            .map_err(Ros3fsError::ListFailure)?;
        let entries: Vec<_> = listed
            .into_iter()
            .map(|o| ObjectEntry {
                path: format!("/{}", o.key),
                size: o.size,
                mtime_ms: o.mtime_ms.unwrap_or(0),
            })
            .collect();
        cache.save(&entries).await?;
        Ok(entries)
    }

    /// `spec.md` §6: attribute lookup, delegated to the tree under the
    /// metadata read lock.
    pub async fn get_attr(&self, path: &str) -> Option<NodeMetadata> {
        self.tree.read().await.lookup(path)
    }

    /// `spec.md` §6: directory listing, delegated to the tree under the
    /// metadata read lock.
    pub async fn read_directory(&self, path: &str) -> Vec<NodeMetadata> {
        self.tree.read().await.list(path)
    }

    /// `spec.md` §6: file bytes, via the cache's get-or-populate with the
    /// object store's `fetch` as the population function. A path absent
    /// from the current tree view fails fast with [`Ros3fsError::NotFound`]
    /// rather than reaching the cache/backend at all.
    pub async fn get_file_contents(&self, path: &str) -> Result<Vec<u8>, Ros3fsError> {
        if self.tree.read().await.lookup(path).is_none() {
            return Err(Ros3fsError::NotFound { path: path.to_string() });
        }

        let key = path.trim_start_matches('/').to_string();
        let client = self.client.clone();
        let result = self
            .cache
            .get_contents(path, || async move {
                client
                    .fetch(&key)
                    .await
                    .map_err(|reason| Ros3fsError::FetchFailure { path: key.clone(), reason })
            })
            .await;

        if let Err(ref e) = result {
            tracing::warn!(path, errno = ?e.kernel_errno(), "get_file_contents failed");
        }
        result
    }

    /// Stops the refresher, joins it, and releases the mount lock.
    pub async fn shutdown(mut self) {
        if let Some(refresher) = self.refresher.take() {
            refresher.stop().await;
        }
        self.cache.release_lock().await;
        CONTEXT_ALIVE.store(false, Ordering::SeqCst);
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        // shutdown() is the documented path (it awaits the refresher join
        // and lock release); this only guards against a Context dropped
        // without an explicit shutdown, so a later init() isn't refused
        // forever.
        if self.refresher.is_some() {
            CONTEXT_ALIVE.store(false, Ordering::SeqCst);
        }
    }
}
