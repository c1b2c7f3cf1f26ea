//! A reference [`ObjectStoreClient`] that mirrors a local directory tree,
//! in the same spirit as the teacher's own `examples/shadow_fs`: it gives
//! the trait something real to drive without standing in for an actual S3
//! wire client.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ros3fs::{ListedObject, ObjectStoreClient};

pub struct LocalMirrorStore {
    root: PathBuf,
}

impl LocalMirrorStore {
    pub fn new(root: PathBuf) -> Self {
        LocalMirrorStore { root }
    }

    fn walk(dir: &Path, root: &Path, out: &mut Vec<ListedObject>) -> std::io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                Self::walk(&path, root, out)?;
            } else if file_type.is_file() {
                let meta = entry.metadata()?;
                let key = path
                    .strip_prefix(root)
                    .expect("walked path is under root")
                    .to_string_lossy()
                    .replace(std::path::MAIN_SEPARATOR, "/");
                let mtime_ms = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                    .map(|d| d.as_millis() as i64);
                out.push(ListedObject { key, size: meta.len(), mtime_ms });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStoreClient for LocalMirrorStore {
    async fn list_all(&self) -> Result<Vec<ListedObject>, String> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || {
            let mut out = Vec::new();
            Self::walk(&root, &root, &mut out).map_err(|e| e.to_string())?;
            Ok(out)
        })
        .await
        .map_err(|e| e.to_string())?
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, String> {
        let path = self.root.join(key);
        tokio::fs::read(&path).await.map_err(|e| format!("{}: {e}", path.display()))
    }
}
