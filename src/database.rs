//! Main entry point for kbindex.
//!
//! This module provides the `KnowledgeBase` struct, the primary entry
//! point for collection management, item CRUD and similarity search.

use crate::error::{Error, Result};
use kbindex_core::{
    CollectionDescriptor, RankParams, SchemaCatalog, SearchResult, TypeTag, DEFAULT_VECTOR_DIMS,
};
use kbindex_primitives::{IndexRegistry, ItemStore, SimilarityRanker, VectorSearch};
use kbindex_store::embed::DEFAULT_EMBED_POOL_WIDTH;
use kbindex_store::gateway::DEFAULT_OP_TIMEOUT;
use kbindex_store::{
    Connector, Embedder, HashEmbedder, MemoryConnector, StoreGateway, TextEmbedder,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// The kbindex knowledge base.
///
/// This is the main entry point for all operations. Create one with
/// [`KnowledgeBase::open_memory`] or [`KnowledgeBase::builder`].
///
/// # Example
///
/// ```ignore
/// use kbindex::prelude::*;
///
/// let kb = KnowledgeBase::open_memory().await?;
///
/// kb.create_collection("algo", TypeTag::Retrieval).await?;
/// let uid = kb.items
///     .create("algo", TypeTag::Retrieval, json!({
///         "code": "def f(): pass",
///         "desc": "an empty function",
///     }))
///     .await?;
///
/// let hits = kb.search.search_text("algo", "function", 5).await?;
///
/// kb.close().await;
/// ```
pub struct KnowledgeBase {
    gateway: Arc<StoreGateway>,
    registry: Arc<IndexRegistry>,

    /// Schema-validated item CRUD
    pub items: ItemStore,

    /// Brute-force ranking over key-value entries
    pub ranker: SimilarityRanker,

    /// Native kNN over vector-bearing collections
    pub search: VectorSearch,
}

impl KnowledgeBase {
    /// Create a builder for configuration.
    pub fn builder() -> KnowledgeBaseBuilder {
        KnowledgeBaseBuilder::new()
    }

    /// Open a knowledge base over in-process backends.
    ///
    /// No external services, no persistence across drops. Uses the
    /// deterministic hash embedder. Intended for tests and embedded use.
    pub async fn open_memory() -> Result<Self> {
        Self::builder().open().await
    }

    /// Create a collection of the given type.
    ///
    /// Registers the name, persists the mapping and creates the physical
    /// index with the type's schema. Fails with `AlreadyExists` if the
    /// name is taken under any type.
    pub async fn create_collection(
        &self,
        name: &str,
        type_tag: TypeTag,
    ) -> Result<CollectionDescriptor> {
        self.registry.register(name, type_tag).await
    }

    /// Delete a collection and its stored items.
    ///
    /// Returns whether the physical index was dropped. The name becomes
    /// available for re-registration, under any type.
    pub async fn delete_collection(&self, name: &str) -> Result<bool> {
        self.registry.deregister(name).await
    }

    /// Look up a collection by name.
    pub fn collection(&self, name: &str) -> Result<CollectionDescriptor> {
        self.registry.resolve(name)
    }

    /// All collections of one type, in name order.
    pub fn list_collections(&self, type_tag: TypeTag) -> Vec<CollectionDescriptor> {
        self.registry.list_by_type(type_tag)
    }

    /// All collections, in name order.
    pub fn list_all_collections(&self) -> Vec<CollectionDescriptor> {
        self.registry.list_all()
    }

    /// Rank the key-value store's entries against a text query.
    pub async fn rank(&self, query: &str, params: &RankParams) -> Result<Vec<SearchResult>> {
        let backends = self.gateway.acquire().await?;
        let entries = backends.kv.entries().await?;
        self.ranker.rank(query, &entries, params).await
    }

    /// Store a value in the key-value store.
    pub async fn kv_set(&self, key: &str, value: Value) -> Result<()> {
        let backends = self.gateway.acquire().await?;
        backends.kv.set(key, value).await
    }

    /// Fetch a value from the key-value store.
    pub async fn kv_get(&self, key: &str) -> Result<Option<Value>> {
        let backends = self.gateway.acquire().await?;
        backends.kv.get(key).await
    }

    /// Delete a key from the key-value store. Returns whether it existed.
    pub async fn kv_delete(&self, key: &str) -> Result<bool> {
        let backends = self.gateway.acquire().await?;
        backends.kv.delete(key).await
    }

    /// Release the store connection.
    ///
    /// Safe to call more than once; the next operation reconnects.
    pub async fn close(&self) {
        self.gateway.shutdown().await;
    }
}

/// Builder for knowledge-base configuration.
///
/// # Example
///
/// ```ignore
/// let kb = KnowledgeBase::builder()
///     .connector(my_connector)
///     .embedder(my_model)
///     .op_timeout(Duration::from_secs(5))
///     .open()
///     .await?;
/// ```
pub struct KnowledgeBaseBuilder {
    connector: Option<Arc<dyn Connector>>,
    model: Option<Arc<dyn TextEmbedder>>,
    dims: Option<usize>,
    pool_width: usize,
    op_timeout: Duration,
    embed_timeout: Duration,
}

impl KnowledgeBaseBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            connector: None,
            model: None,
            dims: None,
            pool_width: DEFAULT_EMBED_POOL_WIDTH,
            op_timeout: DEFAULT_OP_TIMEOUT,
            embed_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    /// Use a custom store connector. Defaults to in-process backends.
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Use a custom embedding model. Defaults to the deterministic hash
    /// embedder.
    pub fn embedder(mut self, model: Arc<dyn TextEmbedder>) -> Self {
        self.model = Some(model);
        self
    }

    /// Vector dimensionality for collection schemas.
    ///
    /// Must match the embedder's output. With the default hash embedder
    /// this also sets its output width. Defaults to
    /// [`DEFAULT_VECTOR_DIMS`].
    pub fn dims(mut self, dims: usize) -> Self {
        self.dims = Some(dims);
        self
    }

    /// Maximum concurrent embedding calls.
    pub fn embed_pool_width(mut self, width: usize) -> Self {
        self.pool_width = width;
        self
    }

    /// Deadline for each store call.
    pub fn op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    /// Deadline for each embedding call.
    pub fn embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    /// Open the knowledge base: connect, create the meta index if needed
    /// and load persisted collection mappings.
    pub async fn open(self) -> Result<KnowledgeBase> {
        let model: Arc<dyn TextEmbedder> = match self.model {
            Some(model) => {
                if let Some(dims) = self.dims {
                    if model.dimension() != dims {
                        return Err(Error::ConstraintViolation(format!(
                            "embedder dimension {} does not match configured dims {}",
                            model.dimension(),
                            dims
                        )));
                    }
                }
                model
            }
            None => Arc::new(HashEmbedder::new(self.dims.unwrap_or(DEFAULT_VECTOR_DIMS))),
        };
        let catalog = SchemaCatalog::new(model.dimension())?;

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(MemoryConnector::in_memory()));
        let gateway = Arc::new(StoreGateway::new(connector, self.op_timeout));
        let embedder = Embedder::new(model, self.pool_width, self.embed_timeout);

        let registry = Arc::new(IndexRegistry::new(gateway.clone(), catalog));
        registry.load().await?;

        Ok(KnowledgeBase {
            items: ItemStore::new(gateway.clone(), registry.clone(), embedder.clone()),
            ranker: SimilarityRanker::new(embedder.clone()),
            search: VectorSearch::new(gateway.clone(), registry.clone(), embedder),
            gateway,
            registry,
        })
    }
}

impl Default for KnowledgeBaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
