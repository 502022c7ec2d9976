//! Secondary-index buckets
//!
//! A [`SecondaryIndex`] maps a hashed key tuple to the list of document ids
//! whose extractor outputs produced that tuple. Bucket lists are append-only:
//! re-saving a document whose key values changed leaves its id in the old
//! bucket as well as the new one. Callers treat bucket contents as a
//! superset of the live matches.

use rustc_hash::{FxHashMap, FxHasher};
use serde_json::Value;
use std::hash::{Hash, Hasher};

/// Combine an ordered tuple of extracted values into one bucket key
///
/// Values are hashed through their canonical JSON rendering, so two tuples
/// compare equal exactly when their serialized forms do. `serde_json` keeps
/// object keys sorted, which makes the rendering deterministic.
pub fn bucket_key(values: &[Value]) -> u64 {
    let mut hasher = FxHasher::default();
    values.len().hash(&mut hasher);
    for value in values {
        value.to_string().hash(&mut hasher);
    }
    hasher.finish()
}

/// One named secondary index: hashed key tuple → document ids
#[derive(Debug, Default)]
pub struct SecondaryIndex {
    buckets: FxHashMap<u64, Vec<String>>,
}

impl SecondaryIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document id to the bucket for `key`
    pub fn append(&mut self, key: u64, id: &str) {
        self.buckets.entry(key).or_default().push(id.to_string());
    }

    /// Ids in the bucket for `key`, empty when the bucket was never written
    pub fn get(&self, key: u64) -> &[String] {
        self.buckets.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
