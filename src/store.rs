//! The object-store client contract (`spec.md` §6). Out of scope to
//! implement for real here — the bucket-facing wire protocol is an external
//! collaborator — but the trait is the seam [`crate::context::Context`]
//! depends on, and `demos/` ships reference implementations to drive it.

use async_trait::async_trait;

/// One entry from a `list_all` page, pre-pagination-coalesced.
#[derive(Debug, Clone)]
pub struct ListedObject {
    pub key: String,
    pub size: u64,
    pub mtime_ms: Option<i64>,
}

/// Paginated listing and whole-object fetch against an S3-compatible
/// bucket. Implementors handle their own pagination internally; `list_all`
/// never returns a partial page to the caller.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Full, page-coalesced object list. Implementations are expected to
    /// page in batches of up to ~100,000 keys, continuing via an opaque
    /// marker, but that detail never escapes this signature.
    async fn list_all(&self) -> Result<Vec<ListedObject>, String>;

    /// Whole-object GET. No byte-range support: this core never requests a
    /// partial fetch.
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, String>;
}
