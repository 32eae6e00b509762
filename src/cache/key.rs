//! Key Normalization Module
//!
//! Turns structured keys into the canonical strings used as map identities.

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

// == Key Normalizer ==
/// Converts an application key into its canonical string identity.
///
/// Implementations must be deterministic, and keys that are structurally
/// equal must normalize to the same string.
pub trait KeyNormalizer<K: ?Sized>: Send + Sync {
    fn normalize(&self, key: &K) -> Result<String>;
}

// == Stable JSON ==
/// Default normalizer: serializes the key to JSON with object fields sorted.
///
/// Strings pass through unchanged, so `"user:1"` normalizes to `user:1`
/// rather than its quoted JSON form. A consequence is that the string `"42"`
/// and the number `42` share an identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct StableJsonKey;

impl<K: Serialize + ?Sized> KeyNormalizer<K> for StableJsonKey {
    fn normalize(&self, key: &K) -> Result<String> {
        normalize_key(key)
    }
}

/// Normalizes `key` the way [`StableJsonKey`] does.
///
/// Converting through `serde_json::Value` sorts object fields, because its
/// map type is ordered by key.
pub fn normalize_key<K: Serialize + ?Sized>(key: &K) -> Result<String> {
    match serde_json::to_value(key)? {
        Value::String(raw) => Ok(raw),
        value => Ok(serde_json::to_string(&value)?),
    }
}
