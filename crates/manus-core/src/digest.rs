//! Content fingerprints for trace entries.
//!
//! Digests are SHA-256 over a canonical JSON encoding (object keys sorted),
//! hex-encoded and truncated to 16 characters. The truncation is a fixed
//! choice: the digest identifies inputs/outputs for replay comparison, it is
//! not a security boundary.

use serde_json::Value;
use sha2::{Digest, Sha256};

const DIGEST_LEN: usize = 16;

/// Fingerprint an arbitrary JSON value.
pub fn digest_value(value: &Value) -> String {
    let canonical = canonicalize(value);
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    let mut encoded = hex::encode(hasher.finalize());
    encoded.truncate(DIGEST_LEN);
    encoded
}

/// Re-encode with object keys sorted so that digests are key-order
/// independent.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: Vec<(&String, &Value)> = map.iter().collect();
            sorted.sort_by_key(|(k, _)| k.as_str());
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
