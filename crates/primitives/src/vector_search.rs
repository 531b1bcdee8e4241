//! VectorSearch: native kNN over collections with an indexed vector
//!
//! The preferred search path. Eligibility is decided by schema, not by
//! probing: a collection qualifies iff its type's schema declares a vector
//! field. The query is embedded once and pushed down to the store's kNN
//! endpoint; candidate documents are never pulled client-side.

use crate::registry::IndexRegistry;
use kbindex_core::{Error, FieldKind, Result, SchemaCatalog, SearchResult};
use kbindex_store::{Embedder, StoreGateway};
use std::sync::Arc;
use tracing::debug;

/// Default candidate-pool size for the store's kNN endpoint.
///
/// A recall/latency knob: the store examines up to this many candidates
/// before returning the top k. Always raised to at least k.
pub const DEFAULT_NUM_CANDIDATES: usize = 100;

/// Native vector search over registered collections.
pub struct VectorSearch {
    gateway: Arc<StoreGateway>,
    registry: Arc<IndexRegistry>,
    catalog: SchemaCatalog,
    embedder: Embedder,
}

impl VectorSearch {
    pub fn new(
        gateway: Arc<StoreGateway>,
        registry: Arc<IndexRegistry>,
        embedder: Embedder,
    ) -> Self {
        let catalog = *registry.catalog();
        VectorSearch {
            gateway,
            registry,
            catalog,
            embedder,
        }
    }

    /// Search a collection with a text query.
    ///
    /// The query is embedded with the same model that embedded the stored
    /// documents, then ranked by the store's native kNN.
    pub async fn search_text(
        &self,
        collection: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        let query_vec = self.embedder.embed(query).await?;
        self.search_vector(collection, &query_vec, k).await
    }

    /// Search a collection with a precomputed query vector.
    ///
    /// Fails with `UnsupportedSchema` when the collection's type declares
    /// no vector field, and `ConstraintViolation` on a dimension mismatch.
    pub async fn search_vector(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(Error::ConstraintViolation("k must be positive".to_string()));
        }

        let descriptor = self.registry.resolve(collection)?;
        let schema = self.catalog.spec_for(descriptor.type_tag);
        let field = schema
            .vector_field()
            .ok_or_else(|| Error::UnsupportedSchema {
                collection: collection.to_string(),
            })?;

        if let FieldKind::Vector { dims, .. } = field.kind {
            if query.len() != dims {
                return Err(Error::ConstraintViolation(format!(
                    "query dimension {} does not match collection '{}' ({})",
                    query.len(),
                    collection,
                    dims
                )));
            }
        }

        let backends = self.gateway.acquire().await?;
        let hits = self
            .gateway
            .bound(
                "knn_search",
                backends.documents.knn_search(
                    &descriptor.physical_id,
                    &field.name,
                    query,
                    k,
                    DEFAULT_NUM_CANDIDATES.max(k),
                ),
            )
            .await?;

        debug!(collection, k, hits = hits.len(), "vector search");
        Ok(hits
            .into_iter()
            .map(|(uid, mut doc, score)| {
                // The stored vector is an implementation detail, not payload.
                if let Some(obj) = doc.as_object_mut() {
                    obj.remove(&field.name);
                }
                SearchResult::new(uid, doc, score)
            })
            .collect())
    }
}
