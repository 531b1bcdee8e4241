//! Convenience re-exports for typical usage.
//!
//! ```ignore
//! use kbindex::prelude::*;
//! ```

pub use crate::database::{KnowledgeBase, KnowledgeBaseBuilder};
pub use crate::error::{Error, Result};
pub use kbindex_core::{
    CollectionDescriptor, RankParams, SearchResult, SearchTarget, TypeTag,
};
pub use serde_json::json;
