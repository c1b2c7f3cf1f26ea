//! Flat object metadata and the node types built from it.

use serde::{Deserialize, Serialize};

/// One listed object, as returned by [`crate::store::ObjectStoreClient::list_all`]
/// or round-tripped through a [`crate::codec`] snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Absolute path: leading `/`, key verbatim after it.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// Milliseconds since the Unix epoch. Defaults to 0 for legacy
    /// snapshots or stores that omit it.
    #[serde(default)]
    pub mtime_ms: i64,
}

/// Tagged kind of a tree node.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
}

/// Metadata for a single node, independent of its position in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMetadata {
    /// Single path component; `"/"` for the root.
    pub name: String,
    /// 0 for directories.
    pub size: u64,
    pub kind: FileKind,
    pub mtime_ms: i64,
}
