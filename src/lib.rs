//! # kbindex
//!
//! Typed knowledge-base collections with semantic similarity search.
//!
//! kbindex manages named collections of structured items. Every collection
//! carries a type tag that fixes its schema; text fields declared with a
//! `{src}_vector` sibling are embedded at write time and searchable with
//! native kNN. Collections without a vector field fall back to brute-force
//! ranking of key-value entries.
//!
//! ## Quick Start
//!
//! ```ignore
//! use kbindex::prelude::*;
//!
//! let kb = KnowledgeBase::open_memory().await?;
//!
//! // Typed collections
//! kb.create_collection("algo", TypeTag::Retrieval).await?;
//!
//! // Items are validated against the collection's schema
//! let uid = kb.items
//!     .create("algo", TypeTag::Retrieval, json!({
//!         "code": "def f(): pass",
//!         "desc": "an empty function that does nothing",
//!     }))
//!     .await?;
//!
//! // Semantic search over the embedded desc field
//! let hits = kb.search.search_text("algo", "function doing nothing", 5).await?;
//!
//! kb.close().await;
//! ```
//!
//! ## Layout
//!
//! - `kbindex-core`: type tags, schemas, errors (no I/O)
//! - `kbindex-store`: store/embedder collaborators and the connection
//!   gateway
//! - `kbindex-primitives`: registry, item CRUD, ranker, vector search
//! - this crate: the [`KnowledgeBase`] facade

#![warn(missing_docs)]

mod database;
mod error;

pub mod prelude;

// Re-export main entry points
pub use database::{KnowledgeBase, KnowledgeBaseBuilder};
pub use error::{Error, Result};

// Re-export the operational layer for direct use
pub use kbindex_primitives::{IndexRegistry, ItemStore, SimilarityRanker, VectorSearch};

// Re-export core vocabulary types
pub use kbindex_core::{
    CollectionDescriptor, RankParams, SchemaCatalog, SearchResult, SearchTarget, TypeTag,
    DEFAULT_VECTOR_DIMS,
};

// Re-export the store seams needed to plug in real backends
pub use kbindex_store::{
    Backends, Connector, Embedder, HashEmbedder, MemoryConnector, StoreGateway, TextEmbedder,
};
