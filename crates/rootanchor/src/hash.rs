//! Certificate fingerprinting.

use ring::digest::{digest, SHA1_FOR_LEGACY_USE_ONLY, SHA256};

/// SHA-256 of a byte slice, hex-encoded.
#[must_use]
pub fn sha256_bytes(data: &[u8]) -> String {
    hex::encode(digest(&SHA256, data).as_ref())
}

/// SHA-1 of a byte slice, hex-encoded.
///
/// Trust-store tooling still addresses certificates by SHA-1
/// (`security delete-certificate -Z`, `certutil -store Root <hash>`), so
/// the legacy digest is kept for lookups only, never for integrity.
#[must_use]
pub fn sha1_bytes(data: &[u8]) -> String {
    hex::encode(digest(&SHA1_FOR_LEGACY_USE_ONLY, data).as_ref())
}
