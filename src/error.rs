//! Error taxonomy for the caching core.
//!
//! Mirrors the fatal/soft/per-request split in the design: callers match on
//! the variant rather than on a formatted message.

use std::fmt;
use std::path::PathBuf;

/// All failure modes the caching core can surface.
#[derive(Debug)]
pub enum Ros3fsError {
    /// Configuration missing, cache dir absent, object store unreachable,
    /// credentials invalid, or a second [`crate::context::Context::init`]
    /// while one is already alive. Fatal.
    StartupFailure(String),
    /// `cache_dir/lock/` already exists.
    MountLocked { cache_dir: PathBuf },
    /// On-disk snapshot could not be decoded.
    SnapshotCorrupt { path: PathBuf, reason: String },
    /// Disk error reading or writing a content or snapshot file.
    CacheIoFailure { path: PathBuf, source: std::io::Error },
    /// Releasing the mount lock on shutdown failed. Logged, not fatal.
    LockReleaseFailed { path: PathBuf, source: std::io::Error },
    /// `ObjectStoreClient::list_all` failed. Soft during a refresh cycle,
    /// fatal if there is no snapshot to fall back on at startup.
    ListFailure(String),
    /// `ObjectStoreClient::fetch` failed for a specific key.
    FetchFailure { path: String, reason: String },
    /// `path` does not resolve in the current directory tree view.
    NotFound { path: String },
}

impl fmt::Display for Ros3fsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ros3fsError::StartupFailure(msg) => write!(f, "startup failed: {msg}"),
            Ros3fsError::MountLocked { cache_dir } => write!(
                f,
                "{} is already locked by another mount; remove it if no other \
                 process holds it",
                cache_dir.join("lock").display()
            ),
            Ros3fsError::SnapshotCorrupt { path, reason } => {
                write!(f, "snapshot {} is corrupt: {reason}", path.display())
            }
            Ros3fsError::CacheIoFailure { path, source } => {
                write!(f, "cache I/O failure on {}: {source}", path.display())
            }
            Ros3fsError::LockReleaseFailed { path, source } => {
                write!(f, "failed to release mount lock {}: {source}", path.display())
            }
            Ros3fsError::ListFailure(msg) => write!(f, "object listing failed: {msg}"),
            Ros3fsError::FetchFailure { path, reason } => {
                write!(f, "fetch failed for {path}: {reason}")
            }
            Ros3fsError::NotFound { path } => write!(f, "{path} does not exist"),
        }
    }
}

impl std::error::Error for Ros3fsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Ros3fsError::CacheIoFailure { source, .. } => Some(source),
            Ros3fsError::LockReleaseFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Kernel-level error codes the (external) kernel adapter should surface.
/// `EACCES`/`ENOENT`/`EIO` are the only three this read-only core ever asks
/// a caller to report.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KernelErrno {
    NoEntry,
    Access,
    Io,
}

impl Ros3fsError {
    /// Maps this error to the kernel-level code a `Read`/`OpenForRead` caller
    /// should report, per `spec.md` §7's propagation policy.
    pub fn kernel_errno(&self) -> KernelErrno {
        match self {
            Ros3fsError::NotFound { .. } => KernelErrno::NoEntry,
            Ros3fsError::CacheIoFailure { source, .. }
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                KernelErrno::Access
            }
            _ => KernelErrno::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_no_entry() {
        let err = Ros3fsError::NotFound { path: "/missing".into() };
        assert_eq!(err.kernel_errno(), KernelErrno::NoEntry);
    }

    #[test]
    fn permission_denied_cache_io_maps_to_access() {
        let err = Ros3fsError::CacheIoFailure {
            path: PathBuf::from("/cache/f"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.kernel_errno(), KernelErrno::Access);
    }

    #[test]
    fn other_cache_io_and_fetch_failures_map_to_io() {
        let cache_err = Ros3fsError::CacheIoFailure {
            path: PathBuf::from("/cache/f"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(cache_err.kernel_errno(), KernelErrno::Io);

        let fetch_err = Ros3fsError::FetchFailure { path: "f".into(), reason: "boom".into() };
        assert_eq!(fetch_err.kernel_errno(), KernelErrno::Io);
    }
}
