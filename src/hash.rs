//! Cryptographic hash functions

use sha2::Digest;

use crate::urdna2015::CanonicalForm;

/// SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = sha2::Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 hash, lowercase hex encoded.
///
/// This is the form used both for blank node hashes during canonicalization and for the
/// payload of a credential signature.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Digest of a canonical form: the signing payload of a credential proof.
pub fn digest(canonical: &CanonicalForm) -> String {
    sha256_hex(canonical.as_bytes())
}
