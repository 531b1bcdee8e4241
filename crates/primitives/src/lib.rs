//! # kbindex-primitives
//!
//! The engine's operational layer, built on `kbindex-core` types and the
//! `kbindex-store` collaborators:
//!
//! - [`IndexRegistry`]: typed collection lifecycle with a persisted
//!   name → namespace mapping
//! - [`ItemStore`]: schema-validated item CRUD with write-time embedding
//! - [`SimilarityRanker`]: brute-force ranking of key-value entries
//! - [`VectorSearch`]: native kNN over collections that index a vector
//!
//! Every primitive goes through the shared [`StoreGateway`] and never
//! derives physical index names itself.
//!
//! [`StoreGateway`]: kbindex_store::StoreGateway

pub mod items;
pub mod ranker;
pub mod registry;
pub mod vector_search;

pub use items::ItemStore;
pub use ranker::SimilarityRanker;
pub use registry::{IndexRegistry, META_INDEX};
pub use vector_search::{VectorSearch, DEFAULT_NUM_CANDIDATES};
