//! Core types for the kbindex engine
//!
//! This module defines the fundamental types used throughout the system:
//! - [`TypeTag`]: the closed set of logical collection kinds
//! - [`CollectionDescriptor`]: immutable name → namespace binding
//! - [`SearchResult`] / [`RankParams`] / [`SearchTarget`]: search surface

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Maximum collection name length accepted by [`validate_collection_name`].
pub const MAX_COLLECTION_NAME_LEN: usize = 128;

/// Logical collection kind.
///
/// Every collection is created under exactly one tag, and every item
/// operation must name the tag it expects. The set is closed: the schema
/// catalog covers each variant exhaustively, so an unknown kind is a
/// compile error rather than a runtime lookup failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    /// Curated question templates
    Predefined,
    /// Past question/code execution records
    History,
    /// Task records with test outcomes
    Task,
    /// Code snippets indexed for semantic retrieval
    Retrieval,
}

impl TypeTag {
    /// All tags, in a fixed documented order.
    pub const ALL: [TypeTag; 4] = [
        TypeTag::Predefined,
        TypeTag::History,
        TypeTag::Task,
        TypeTag::Retrieval,
    ];

    /// Wire name for this tag (also the physical-id prefix).
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Predefined => "predefined",
            TypeTag::History => "history",
            TypeTag::Task => "task",
            TypeTag::Retrieval => "retrieval",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "predefined" => Some(TypeTag::Predefined),
            "history" => Some(TypeTag::History),
            "task" => Some(TypeTag::Task),
            "retrieval" => Some(TypeTag::Retrieval),
            _ => None,
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable binding between a user-chosen collection name, its type, and
/// the physical storage namespace backing it.
///
/// Descriptors are owned exclusively by the index registry: created on
/// collection-create, removed on collection-delete, never mutated. The
/// `physical_id` is derived deterministically from `(type, name)` and is
/// stable for the collection's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    /// User-chosen name, globally unique across all type tags
    pub name: String,
    /// Declared collection kind
    #[serde(rename = "type")]
    pub type_tag: TypeTag,
    /// Physical index identifier in the document store
    pub physical_id: String,
}

impl CollectionDescriptor {
    /// Create a descriptor for a validated name.
    ///
    /// The physical id is `{type}_{name}`; because validated names never
    /// start with `_` and tags are a closed set, distinct (type, name)
    /// pairs always map to distinct physical ids.
    pub fn new(name: impl Into<String>, type_tag: TypeTag) -> Self {
        let name = name.into();
        let physical_id = format!("{}_{}", type_tag.name(), name);
        CollectionDescriptor {
            name,
            type_tag,
            physical_id,
        }
    }
}

impl std::fmt::Display for CollectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.type_tag, self.name)
    }
}

/// Which side of a (key, value) entry the brute-force ranker embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTarget {
    /// Embed the entry key
    Key,
    /// Embed a canonical JSON serialization of the entry value
    #[default]
    Value,
}

/// Parameters for a similarity-ranking request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RankParams {
    /// Maximum number of results to return (must be >= 1)
    pub top_k: usize,
    /// Minimum cosine similarity to keep, in [-1, 1]
    pub threshold: f32,
    /// Whether keys or values are ranked
    #[serde(default)]
    pub target: SearchTarget,
}

impl RankParams {
    /// Create params with the default target ([`SearchTarget::Value`]).
    pub fn new(top_k: usize, threshold: f32) -> Self {
        RankParams {
            top_k,
            threshold,
            target: SearchTarget::default(),
        }
    }

    /// Set the ranking target.
    pub fn with_target(mut self, target: SearchTarget) -> Self {
        self.target = target;
        self
    }

    /// Validate parameter ranges before any embedding work is done.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::ConstraintViolation(
                "top_k must be positive".to_string(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.threshold) || self.threshold.is_nan() {
            return Err(Error::ConstraintViolation(format!(
                "threshold {} outside [-1, 1]",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// A single ranked search hit.
///
/// `score` is cosine similarity in [-1, 1], higher = more similar. Result
/// sequences are ordered by score descending; equal scores preserve the
/// input iteration order so output is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Entry key or store-assigned item uid
    pub key: String,
    /// The matched payload
    pub payload: serde_json::Value,
    /// Similarity score (higher = more similar)
    pub score: f32,
}

impl SearchResult {
    /// Create a new SearchResult.
    pub fn new(key: impl Into<String>, payload: serde_json::Value, score: f32) -> Self {
        SearchResult {
            key: key.into(),
            payload,
            score,
        }
    }
}

/// Validate a collection name for safe use in a physical namespace.
///
/// Rules: non-empty, at most [`MAX_COLLECTION_NAME_LEN`] bytes, ASCII
/// lowercase alphanumerics plus `-` and `_`, and must not begin with `_`
/// or `-` (leading underscores are reserved for engine-internal indices).
pub fn validate_collection_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.len() > MAX_COLLECTION_NAME_LEN {
        return Err(invalid("name exceeds maximum length"));
    }
    if name.starts_with('_') || name.starts_with('-') {
        return Err(invalid("name starts with a reserved character"));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
    {
        return Err(invalid(&format!(
            "character '{}' is unsafe for the physical namespace",
            c
        )));
    }
    Ok(())
}
