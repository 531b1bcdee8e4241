//! # kbindex-core
//!
//! Leaf types for the kbindex engine:
//!
//! - [`TypeTag`]: the closed set of logical collection kinds
//! - [`CollectionDescriptor`]: name → (type, physical namespace) binding
//! - [`SchemaCatalog`]: per-type field layouts applied at collection create
//! - [`SearchResult`] / [`RankParams`]: similarity-search surface types
//! - [`Error`]: the unified error taxonomy
//!
//! This crate has no I/O. Everything that talks to a store or an embedder
//! lives in `kbindex-store` and `kbindex-primitives`.

pub mod error;
pub mod schema;
pub mod types;
pub mod vector;

pub use error::{Error, Result};
pub use vector::cosine_similarity;
pub use schema::{
    DistanceMetric, FieldKind, FieldSpec, SchemaCatalog, SchemaSpec, DEFAULT_VECTOR_DIMS,
};
pub use types::{
    validate_collection_name, CollectionDescriptor, RankParams, SearchResult, SearchTarget,
    TypeTag,
};
