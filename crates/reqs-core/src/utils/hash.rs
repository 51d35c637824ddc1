//! Blake3 hashing utilities for set fingerprints.

/// Compute the Blake3 hash of data as lowercase hex
pub fn blake3_hex(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Check a fingerprint against data, ignoring hex case
pub fn matches_fingerprint(data: &[u8], expected: &str) -> bool {
    blake3_hex(data).eq_ignore_ascii_case(expected.trim())
}
