//! ros3fs — metadata and content caching core for a read-only FUSE view of
//! an S3-compatible bucket.
//!
//! This crate is the core described in the design: it turns a flat object
//! listing into a directory tree, caches object bodies on local disk, and
//! refreshes both on a background schedule. The kernel adapter, the CLI
//! parser, and the object-store wire protocol are external collaborators;
//! [`store::ObjectStoreClient`] is the seam between this crate and the
//! last of those.

pub mod cache;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod fingerprint;
pub mod model;
pub mod refresher;
pub mod store;
pub mod tree;

pub use context::{Context, ContextConfig};
pub use error::Ros3fsError;
pub use model::{FileKind, NodeMetadata, ObjectEntry};
pub use store::{ListedObject, ObjectStoreClient};
