//! Encodes/decodes the flat object list to/from the on-disk snapshot format.
//!
//! The format is a JSON array of [`ObjectEntry`]; `mtime_ms` is optional on
//! read so legacy snapshots written before it existed still load.

use crate::error::Ros3fsError;
use crate::model::ObjectEntry;
use std::path::Path;

/// Encodes `entries` as the snapshot's self-describing text format.
pub fn encode(entries: &[ObjectEntry]) -> String {
    // Infallible: ObjectEntry has no types serde_json can choke on.
    serde_json::to_string_pretty(entries).expect("ObjectEntry is always serializable")
}

/// Decodes a document produced by [`encode`] (or a legacy snapshot missing
/// `mtime_ms`). Fails with [`Ros3fsError::SnapshotCorrupt`] if the document
/// is not well-formed or a required field is missing or malformed.
pub fn decode(path: &Path, document: &str) -> Result<Vec<ObjectEntry>, Ros3fsError> {
    serde_json::from_str(document).map_err(|e| Ros3fsError::SnapshotCorrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
