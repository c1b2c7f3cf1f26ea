//! Stable hex digests used to derive cache-file and metadata-file names.
//!
//! Not used for integrity checking, only for turning an arbitrary logical
//! path (or `endpoint || bucket` pair) into a filesystem-safe filename.

use data_encoding::HEXLOWER;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest of `s`. Equal inputs always produce equal
/// output; collisions are cryptographically implausible.
pub fn fingerprint(s: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_ref());
    HEXLOWER.encode(&hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_deterministic() {
        assert_eq!(fingerprint("/a/b.txt"), fingerprint("/a/b.txt"));
    }

    #[test]
    fn differs_for_different_inputs() {
        assert_ne!(fingerprint("/a/b.txt"), fingerprint("/a/c.txt"));
    }

    #[test]
    fn is_lowercase_hex_of_fixed_length() {
        let digest = fingerprint("anything");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn concatenation_matches_endpoint_bucket_convention() {
        let a = fingerprint(format!("{}{}", "https://s3.example.com", "my-bucket"));
        let b = fingerprint("https://s3.example.commy-bucket");
        assert_eq!(a, b);
    }
}
