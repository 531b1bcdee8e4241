//! Schema catalog: per-TypeTag field layouts
//!
//! The catalog is compiled-in configuration, consulted only when a
//! collection is physically created and when item payloads are validated.
//! There are no mutation operations and no versioning; a schema change
//! means a new collection.

use crate::error::{Error, Result};
use crate::types::TypeTag;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default embedding dimensionality for vector fields (MiniLM-class models).
pub const DEFAULT_VECTOR_DIMS: usize = 384;

/// Suffix marking a field as derived from a sibling text field.
const VECTOR_FIELD_SUFFIX: &str = "_vector";

/// Similarity metric declared on a vector field.
///
/// All metrics are normalized to "higher = more similar"; scores reported
/// by search are in the metric's native range (cosine: [-1, 1]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine similarity: dot(a,b) / (||a|| * ||b||)
    #[default]
    Cosine,
    /// Raw dot product; assumes pre-normalized vectors
    DotProduct,
}

impl DistanceMetric {
    /// Human-readable name for display and store mappings.
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::DotProduct => "dot_product",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Some(DistanceMetric::Cosine),
            "dot_product" | "dot" | "inner_product" => Some(DistanceMetric::DotProduct),
            _ => None,
        }
    }
}

/// How a field is stored and indexed in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Exact-match string (not analyzed)
    Keyword,
    /// Free text, analyzed for full-text match
    Text,
    /// Whole number
    Integer,
    /// Floating-point number
    Float,
    /// Nested array of sub-documents
    Nested,
    /// Dense embedding vector, indexed for kNN
    Vector {
        /// Embedding dimensionality
        dims: usize,
        /// Declared similarity metric
        metric: DistanceMetric,
    },
}

impl FieldKind {
    /// Mapping-level name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Keyword => "keyword",
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Nested => "nested",
            FieldKind::Vector { .. } => "vector",
        }
    }

    /// Check whether a JSON value is acceptable for this kind.
    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::Keyword | FieldKind::Text => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Float => value.is_number(),
            FieldKind::Nested => value.is_array(),
            FieldKind::Vector { dims, .. } => value
                .as_array()
                .is_some_and(|a| a.len() == *dims && a.iter().all(Value::is_number)),
        }
    }
}

/// A single named field in a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name as stored in the document
    pub name: String,
    /// Storage/index kind
    pub kind: FieldKind,
}

impl FieldSpec {
    fn new(name: &str, kind: FieldKind) -> Self {
        FieldSpec {
            name: name.to_string(),
            kind,
        }
    }
}

/// Ordered field layout for one collection type.
///
/// Static and read-only: built by [`SchemaCatalog`], applied at
/// collection-create time, and consulted for payload validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSpec {
    /// Declared fields, in mapping order
    pub fields: Vec<FieldSpec>,
    /// Field names projected into list-items summaries
    pub summary_fields: Vec<String>,
}

impl SchemaSpec {
    /// Look up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The first declared vector field, if any.
    pub fn vector_field(&self) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|f| matches!(f.kind, FieldKind::Vector { .. }))
    }

    /// Source text field for a derived vector field.
    ///
    /// By convention `{src}_vector` is embedded from `{src}`; returns the
    /// source field name when the convention holds and `{src}` is declared.
    pub fn vector_source(&self, vector_field: &str) -> Option<&str> {
        let src = vector_field.strip_suffix(VECTOR_FIELD_SUFFIX)?;
        self.field(src).map(|f| f.name.as_str())
    }

    /// Validate a full create payload.
    ///
    /// Every declared non-vector field must be present with a matching
    /// kind; unknown fields are rejected; vector fields are derived by the
    /// engine and may not be supplied by the caller.
    pub fn validate_create(&self, payload: &Value) -> Result<()> {
        let obj = payload
            .as_object()
            .ok_or_else(|| Error::InvalidSchema("payload must be a JSON object".to_string()))?;

        for field in &self.fields {
            if matches!(field.kind, FieldKind::Vector { .. }) {
                continue;
            }
            match obj.get(&field.name) {
                Some(value) if field.kind.accepts(value) => {}
                Some(_) => {
                    return Err(Error::InvalidSchema(format!(
                        "field '{}' is not a valid {}",
                        field.name,
                        field.kind.name()
                    )))
                }
                None => {
                    return Err(Error::InvalidSchema(format!(
                        "missing field '{}'",
                        field.name
                    )))
                }
            }
        }
        self.reject_unknown_or_derived(obj)
    }

    /// Validate a partial-merge update payload.
    ///
    /// Present fields must match their declared kind; absent fields keep
    /// their stored value. At least one field must be supplied.
    pub fn validate_partial(&self, payload: &Value) -> Result<()> {
        let obj = payload
            .as_object()
            .ok_or_else(|| Error::InvalidSchema("payload must be a JSON object".to_string()))?;

        if obj.is_empty() {
            return Err(Error::InvalidSchema("empty update payload".to_string()));
        }

        for (name, value) in obj {
            match self.field(name) {
                Some(field) if matches!(field.kind, FieldKind::Vector { .. }) => {
                    return Err(Error::InvalidSchema(format!(
                        "field '{}' is derived and cannot be written directly",
                        name
                    )))
                }
                Some(field) if !field.kind.accepts(value) => {
                    return Err(Error::InvalidSchema(format!(
                        "field '{}' is not a valid {}",
                        name,
                        field.kind.name()
                    )))
                }
                Some(_) => {}
                None => {
                    return Err(Error::InvalidSchema(format!("unknown field '{}'", name)))
                }
            }
        }
        Ok(())
    }

    fn reject_unknown_or_derived(&self, obj: &serde_json::Map<String, Value>) -> Result<()> {
        for name in obj.keys() {
            match self.field(name) {
                None => return Err(Error::InvalidSchema(format!("unknown field '{}'", name))),
                Some(field) if matches!(field.kind, FieldKind::Vector { .. }) => {
                    return Err(Error::InvalidSchema(format!(
                        "field '{}' is derived and cannot be written directly",
                        name
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Project a stored document down to its summary fields, keyed by uid.
    pub fn summarize(&self, uid: &str, doc: &Value) -> Value {
        let mut out = serde_json::Map::new();
        out.insert("uid".to_string(), Value::String(uid.to_string()));
        if let Some(obj) = doc.as_object() {
            for name in &self.summary_fields {
                if let Some(v) = obj.get(name) {
                    out.insert(name.clone(), v.clone());
                }
            }
        }
        Value::Object(out)
    }
}

/// Static lookup from [`TypeTag`] to [`SchemaSpec`].
///
/// Compiled-in configuration; the tag enum is closed, so coverage is
/// checked by the compiler rather than at validation time. The only knob
/// is vector dimensionality, fixed per engine instance to match the
/// configured embedder.
#[derive(Debug, Clone, Copy)]
pub struct SchemaCatalog {
    dims: usize,
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        SchemaCatalog {
            dims: DEFAULT_VECTOR_DIMS,
        }
    }
}

impl SchemaCatalog {
    /// Create a catalog whose vector fields use the given dimensionality.
    pub fn new(dims: usize) -> Result<Self> {
        if dims == 0 {
            return Err(Error::ConstraintViolation(
                "vector dimensionality must be positive".to_string(),
            ));
        }
        Ok(SchemaCatalog { dims })
    }

    /// Vector dimensionality applied to all vector fields.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// The field layout for a collection type.
    pub fn spec_for(&self, tag: TypeTag) -> SchemaSpec {
        match tag {
            TypeTag::Predefined => SchemaSpec {
                fields: vec![
                    FieldSpec::new("name", FieldKind::Keyword),
                    FieldSpec::new("question", FieldKind::Text),
                ],
                summary_fields: vec!["name".to_string()],
            },
            TypeTag::History => SchemaSpec {
                fields: vec![
                    FieldSpec::new("name", FieldKind::Keyword),
                    FieldSpec::new("question", FieldKind::Text),
                    FieldSpec::new("code", FieldKind::Text),
                ],
                summary_fields: vec!["name".to_string(), "question".to_string()],
            },
            TypeTag::Task => SchemaSpec {
                fields: vec![
                    FieldSpec::new("name", FieldKind::Keyword),
                    FieldSpec::new("progress", FieldKind::Keyword),
                    FieldSpec::new("num_tests", FieldKind::Integer),
                    FieldSpec::new("pass_rate", FieldKind::Float),
                    FieldSpec::new("cover_rate", FieldKind::Float),
                    FieldSpec::new("question", FieldKind::Text),
                    FieldSpec::new("code", FieldKind::Text),
                    FieldSpec::new("tests", FieldKind::Nested),
                ],
                summary_fields: vec!["name".to_string(), "progress".to_string()],
            },
            TypeTag::Retrieval => SchemaSpec {
                fields: vec![
                    FieldSpec::new("code", FieldKind::Text),
                    FieldSpec::new("desc", FieldKind::Text),
                    FieldSpec::new(
                        "desc_vector",
                        FieldKind::Vector {
                            dims: self.dims,
                            metric: DistanceMetric::Cosine,
                        },
                    ),
                ],
                summary_fields: vec!["desc".to_string()],
            },
        }
    }
}
