use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ros3fs::store::ListedObject;
use ros3fs::ObjectStoreClient;

/// An in-memory object store, mirroring the spirit of the teacher's
/// `examples/in_memory` demo VFS: enough of a real backend to drive the
/// trait through tests without touching the network.
pub struct MockStore {
    pub objects: Vec<ListedObject>,
    pub bodies: HashMap<String, Vec<u8>>,
    pub fetch_calls: AtomicUsize,
}

impl MockStore {
    pub fn new(objects: Vec<ListedObject>, bodies: HashMap<String, Vec<u8>>) -> Arc<Self> {
        Arc::new(MockStore { objects, bodies, fetch_calls: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl ObjectStoreClient for MockStore {
    async fn list_all(&self) -> Result<Vec<ListedObject>, String> {
        Ok(self.objects.clone())
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, String> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.bodies.get(key).cloned().ok_or_else(|| format!("no such key: {key}"))
    }
}
