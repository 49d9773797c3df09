//! Canonical JSON for model files
//!
//! A model serialized twice must produce the same bytes so that its blake3
//! hash can identify it. Object keys are sorted recursively and the output
//! is compact.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanonicalError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Serialize a value to canonical JSON (sorted keys, no whitespace)
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&canonicalize(value))?)
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, canonicalize(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Blake3 hash of the canonical JSON representation
pub fn hash_canonical<T: Serialize>(value: &T) -> Result<[u8; 32], CanonicalError> {
    let json = to_canonical_json(value)?;
    Ok(*blake3::hash(json.as_bytes()).as_bytes())
}

/// Blake3 hash of the canonical JSON representation, hex encoded
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    Ok(hex::encode(hash_canonical(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Leaf {
        weight: f64,
        id: u32,
    }

    #[derive(Serialize)]
    struct Wrapper {
        trees: Vec<Leaf>,
        version: u32,
        bias: f64,
    }

    fn sample() -> Wrapper {
        Wrapper {
            trees: vec![Leaf { weight: 0.5, id: 0 }, Leaf { weight: -1.25, id: 1 }],
            version: 1,
            bias: 0.0,
        }
    }

    #[test]
    fn test_keys_sorted_at_every_level() {
        let json = to_canonical_json(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"bias":0.0,"trees":[{"id":0,"weight":0.5},{"id":1,"weight":-1.25}],"version":1}"#
        );
    }

    #[test]
    fn test_hash_is_stable() {
        let hash1 = hash_canonical_hex(&sample()).unwrap();
        let hash2 = hash_canonical_hex(&sample()).unwrap();
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_hash_tracks_content() {
        let mut other = sample();
        other.trees[1].weight = -1.5;
        assert_ne!(
            hash_canonical_hex(&sample()).unwrap(),
            hash_canonical_hex(&other).unwrap()
        );
    }
}
