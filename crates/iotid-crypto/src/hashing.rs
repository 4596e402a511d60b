//! Key fingerprints and hashing helpers.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha384};

/// Fingerprint of a public key: SHA-384, base64url without padding.
///
/// This is the form used by `sign-key-sha3-384` and `public-key-sha3-384`
/// headers and by the configured signing-key allowlist.
pub fn key_fingerprint(public_key: &[u8]) -> String {
    let digest = Sha384::digest(public_key);
    URL_SAFE_NO_PAD.encode(digest)
}

/// Hash data using BLAKE3
///
/// Used for log-safe identifiers, never for signatures.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    blake3::hash(data).into()
}

/// Short, non-reversible stand-in for a value that must not appear in logs
pub fn hash_for_log(value: &str) -> String {
    let hash = blake3_hash(value.as_bytes());
    hex::encode(&hash[..8])
}

/// Securely compare two byte slices in constant time
///
/// This prevents timing attacks when comparing shared secrets.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}
