//! Document store collaborator
//!
//! [`DocumentStore`] is the engine's contract with whatever document index
//! backs collections (an Elasticsearch-class service in production, the
//! in-process [`MemoryDocumentStore`] in tests and embedded deployments).
//! The engine never derives physical index names itself; it always passes
//! ids resolved by the registry.
//!
//! ## Determinism
//!
//! `list_documents` iterates in uid order and `knn_search` breaks score
//! ties by uid, so results are stable given stable contents.

use async_trait::async_trait;
use kbindex_core::schema::{FieldKind, SchemaSpec};
use kbindex_core::vector::cosine_similarity;
use kbindex_core::{Error, Result};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;

/// Async contract for the backing document index.
///
/// All methods are independent single calls; there are no cross-call
/// transactions. Implementations map transport failures to
/// [`Error::StoreUnavailable`] so callers can retry with backoff.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a physical index with a schema-on-write mapping.
    ///
    /// Fails with `AlreadyExists` if the index is already present.
    async fn create_index(&self, index: &str, schema: &SchemaSpec) -> Result<()>;

    /// Delete a physical index and every document in it.
    ///
    /// Fails with `NotFound` if the index is absent.
    async fn delete_index(&self, index: &str) -> Result<()>;

    /// Check whether a physical index exists.
    async fn index_exists(&self, index: &str) -> Result<bool>;

    /// Store a document under the given uid (upsert semantics).
    async fn put_document(&self, index: &str, uid: &str, doc: Value) -> Result<()>;

    /// Fetch a document by uid. `None` when the uid is absent.
    async fn get_document(&self, index: &str, uid: &str) -> Result<Option<Value>>;

    /// List all documents as (uid, doc) pairs in uid order.
    async fn list_documents(&self, index: &str) -> Result<Vec<(String, Value)>>;

    /// Merge a partial document into an existing one (top-level fields).
    ///
    /// Fails with `NotFound` if the uid is absent.
    async fn merge_document(&self, index: &str, uid: &str, partial: Value) -> Result<()>;

    /// Delete a document by uid. Returns whether it existed.
    async fn delete_document(&self, index: &str, uid: &str) -> Result<bool>;

    /// Native approximate-nearest-neighbor query against a vector field.
    ///
    /// Returns at most `k` hits as (uid, doc, score), score descending,
    /// ties by uid. `num_candidates` (always >= `k`) is a recall/latency
    /// knob for approximate backends; exact backends may ignore it.
    async fn knn_search(
        &self,
        index: &str,
        field: &str,
        query: &[f32],
        k: usize,
        num_candidates: usize,
    ) -> Result<Vec<(String, Value, f32)>>;
}

struct MemIndex {
    schema: SchemaSpec,
    docs: BTreeMap<String, Value>,
}

/// In-process document store.
///
/// Holds indices in a `BTreeMap` guarded by a single `RwLock`; brute-force
/// kNN over the declared vector field. Suitable for tests and small
/// embedded corpora; the contract matches what a networked store provides.
#[derive(Default)]
pub struct MemoryDocumentStore {
    indices: RwLock<BTreeMap<String, MemIndex>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn missing(index: &str) -> Error {
        Error::NotFound(format!("index '{}'", index))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create_index(&self, index: &str, schema: &SchemaSpec) -> Result<()> {
        let mut indices = self.indices.write();
        if indices.contains_key(index) {
            return Err(Error::AlreadyExists(format!("index '{}'", index)));
        }
        indices.insert(
            index.to_string(),
            MemIndex {
                schema: schema.clone(),
                docs: BTreeMap::new(),
            },
        );
        tracing::debug!(index, "created index");
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        let removed = self.indices.write().remove(index);
        if removed.is_none() {
            return Err(Self::missing(index));
        }
        tracing::debug!(index, "deleted index");
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> Result<bool> {
        Ok(self.indices.read().contains_key(index))
    }

    async fn put_document(&self, index: &str, uid: &str, doc: Value) -> Result<()> {
        let mut indices = self.indices.write();
        let idx = indices.get_mut(index).ok_or_else(|| Self::missing(index))?;
        idx.docs.insert(uid.to_string(), doc);
        Ok(())
    }

    async fn get_document(&self, index: &str, uid: &str) -> Result<Option<Value>> {
        let indices = self.indices.read();
        let idx = indices.get(index).ok_or_else(|| Self::missing(index))?;
        Ok(idx.docs.get(uid).cloned())
    }

    async fn list_documents(&self, index: &str) -> Result<Vec<(String, Value)>> {
        let indices = self.indices.read();
        let idx = indices.get(index).ok_or_else(|| Self::missing(index))?;
        Ok(idx
            .docs
            .iter()
            .map(|(uid, doc)| (uid.clone(), doc.clone()))
            .collect())
    }

    async fn merge_document(&self, index: &str, uid: &str, partial: Value) -> Result<()> {
        let mut indices = self.indices.write();
        let idx = indices.get_mut(index).ok_or_else(|| Self::missing(index))?;
        let doc = idx
            .docs
            .get_mut(uid)
            .ok_or_else(|| Error::NotFound(format!("document '{}'", uid)))?;

        let (Some(target), Some(fields)) = (doc.as_object_mut(), partial.as_object()) else {
            return Err(Error::Serialization(
                "merge requires JSON objects".to_string(),
            ));
        };
        for (k, v) in fields {
            target.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    async fn delete_document(&self, index: &str, uid: &str) -> Result<bool> {
        let mut indices = self.indices.write();
        let idx = indices.get_mut(index).ok_or_else(|| Self::missing(index))?;
        Ok(idx.docs.remove(uid).is_some())
    }

    async fn knn_search(
        &self,
        index: &str,
        field: &str,
        query: &[f32],
        k: usize,
        _num_candidates: usize,
    ) -> Result<Vec<(String, Value, f32)>> {
        let indices = self.indices.read();
        let idx = indices.get(index).ok_or_else(|| Self::missing(index))?;

        match idx.schema.field(field).map(|f| &f.kind) {
            Some(FieldKind::Vector { dims, .. }) => {
                if query.len() != *dims {
                    return Err(Error::ConstraintViolation(format!(
                        "query dimension {} does not match field '{}' ({})",
                        query.len(),
                        field,
                        dims
                    )));
                }
            }
            _ => {
                return Err(Error::ConstraintViolation(format!(
                    "field '{}' is not a vector field",
                    field
                )))
            }
        }

        // Exact backend: every stored vector is scanned, so the candidate
        // knob cannot cost recall here. Docs without the field (never
        // embedded) are skipped.
        let mut scored: Vec<(String, Value, f32)> = Vec::new();
        for (uid, doc) in idx.docs.iter() {
            let Some(stored) = doc.get(field).and_then(Value::as_array) else {
                continue;
            };
            let stored: Vec<f32> = stored
                .iter()
                .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                .collect();
            let score = match cosine_similarity(query, &stored) {
                Ok(s) => s,
                Err(Error::DegenerateVector(_)) => 0.0,
                Err(e) => return Err(e),
            };
            scored.push((uid.clone(), doc.clone(), score));
        }

        // Score desc, ties by uid asc (input is already uid-ordered).
        scored.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}
