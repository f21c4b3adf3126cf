//! Input fingerprints for recalculation runs.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 of `content`, hex encoded.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint of any serializable snapshot.
///
/// Two runs with the same fingerprint saw identical inputs, which makes
/// same-day reruns easy to recognise in the run history.
pub fn fingerprint<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let content = serde_json::to_string(value)?;
    Ok(calculate_checksum(&content))
}
