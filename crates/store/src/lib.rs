//! # kbindex-store
//!
//! External collaborators of the kbindex engine and the shared connection
//! resource that owns them:
//!
//! - [`DocumentStore`]: schema-on-write document index with optional
//!   native vector kNN
//! - [`KvStore`]: opaque-key JSON blob store
//! - [`TextEmbedder`] / [`Embedder`]: text → fixed-length vector, run off
//!   the async request path behind a bounded pool
//! - [`StoreGateway`]: lazily-initialized shared connection with a
//!   documented open/close lifecycle
//!
//! In-process reference backends ([`MemoryDocumentStore`],
//! [`MemoryKvStore`], [`HashEmbedder`]) back tests and embedded use.

pub mod doc_store;
pub mod embed;
pub mod gateway;
pub mod kv_store;

pub use doc_store::{DocumentStore, MemoryDocumentStore};
pub use embed::{Embedder, HashEmbedder, TextEmbedder};
pub use gateway::{Backends, Connector, MemoryConnector, StoreGateway};
pub use kv_store::{KvStore, MemoryKvStore};
