//! Key-value store collaborator
//!
//! Whole-value JSON blobs under opaque keys. The engine uses this for
//! configuration/history storage held outside the document index; the
//! brute-force ranker can rank snapshots of its contents.

use async_trait::async_trait;
use kbindex_core::Result;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;

/// Async contract for the opaque-key JSON store.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch a value. `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store a whole value under a key (upsert semantics).
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Delete a key. Returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Snapshot all entries in key order.
    ///
    /// Feeds the brute-force ranker, which needs a deterministic input
    /// order for stable tie-breaking.
    async fn entries(&self) -> Result<Vec<(String, Value)>>;
}

/// In-process key-value store backed by a `BTreeMap`.
#[derive(Default)]
pub struct MemoryKvStore {
    data: RwLock<BTreeMap<String, Value>>,
}

impl MemoryKvStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.data.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.data.write().remove(key).is_some())
    }

    async fn entries(&self) -> Result<Vec<(String, Value)>> {
        Ok(self
            .data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
