//! Background task that periodically re-lists the bucket, rebuilds the
//! tree, rewrites the snapshot, and purges stale content files.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};

use crate::cache::CacheStore;
use crate::store::ObjectStoreClient;
use crate::tree::DirectoryTree;

/// Handle to a spawned refresher. Dropping it does not stop the task; call
/// [`MetadataRefresher::stop`] and await the join handle for a clean
/// shutdown.
pub struct MetadataRefresher {
    stop_tx: watch::Sender<bool>,
    join: tokio::task::JoinHandle<()>,
}

impl MetadataRefresher {
    /// Spawns the refresh loop. `update_seconds` of 0 disables periodic
    /// refresh entirely -- no tick ever fires, and the task only ever wakes
    /// to observe `stop`, which it still does promptly.
    pub fn spawn(
        tree: Arc<RwLock<Arc<DirectoryTree>>>,
        cache: Arc<CacheStore>,
        client: Arc<dyn ObjectStoreClient>,
        update_seconds: u64,
    ) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let join = if update_seconds == 0 {
            tokio::spawn(async move {
                let _ = stop_rx.changed().await;
                tracing::info!("refresher (disabled, update_seconds=0) received stop signal");
            })
        } else {
            let period = Duration::from_secs(update_seconds);
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(period) => {}
                        _ = stop_rx.changed() => {
                            if *stop_rx.borrow() {
                                tracing::info!("refresher received stop signal");
                                return;
                            }
                        }
                    }
                    if *stop_rx.borrow() {
                        return;
                    }
                    run_cycle(&tree, &cache, client.as_ref()).await;
                }
            })
        };

        MetadataRefresher { stop_tx, join }
    }

    /// Signals the loop to stop and joins it.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "refresher task panicked");
        }
    }
}

async fn run_cycle(
    tree: &Arc<RwLock<Arc<DirectoryTree>>>,
    cache: &Arc<CacheStore>,
    client: &dyn ObjectStoreClient,
) {
    tracing::debug!("refresh cycle starting");
    let listed = match client.list_all().await {
        Ok(listed) => listed,
        Err(e) => {
            tracing::warn!(error = %e, "list_all failed during refresh, keeping existing tree");
            return;
        }
    };

    let entries: Vec<_> = listed
        .into_iter()
        .map(|o| crate::model::ObjectEntry {
            path: format!("/{}", o.key),
            size: o.size,
            mtime_ms: o.mtime_ms.unwrap_or(0),
        })
        .collect();

    // Snapshot-first: a crash mid-refresh still has fresh data to load on
    // next boot, since the snapshot is only ever read at startup.
    if let Err(e) = cache.save(&entries).await {
        tracing::warn!(error = %e, "failed to write metadata snapshot during refresh");
        return;
    }

    let new_tree = Arc::new(DirectoryTree::build(&entries));
    {
        let mut guard = tree.write().await;
        *guard = new_tree;
    }
    tracing::info!(objects = entries.len(), "refresh cycle rebuilt tree");

    if let Err(e) = cache.clear_stale_content().await {
        tracing::warn!(error = %e, "failed to purge stale content during refresh");
    }
}
