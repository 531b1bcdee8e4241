//! Unified error types for kbindex
//!
//! One canonical taxonomy for every operation in the engine. Boundary
//! layers (HTTP, RPC) map [`Error::kind`] to transport status codes;
//! nothing in the engine is signalled by panics or sentinel values.

use crate::types::TypeTag;
use thiserror::Error;

/// Result type alias for kbindex operations.
pub type Result<T> = std::result::Result<T, Error>;

/// All kbindex errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Collection name or item uid not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate collection name on create (regardless of type)
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Collection resolved to a different type than the caller expected
    #[error("type mismatch for '{name}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// Collection name that was resolved
        name: String,
        /// Type the caller expected
        expected: TypeTag,
        /// Type the registry actually recorded
        actual: TypeTag,
    },

    /// Collection name is empty or unsafe for the physical namespace
    #[error("invalid name '{name}': {reason}")]
    InvalidName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Malformed item payload (unknown field, kind mismatch, missing field)
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Transport or connection failure talking to a backing store (retryable)
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// External call exceeded its deadline (retryable)
    #[error("timeout after {elapsed_ms}ms in {op}")]
    Timeout {
        /// Operation that timed out
        op: String,
        /// Configured deadline in milliseconds
        elapsed_ms: u64,
    },

    /// Zero-norm embedding; callers substitute a deterministic fallback score
    #[error("degenerate vector: {0}")]
    DegenerateVector(String),

    /// Native vector search requested on a collection with no vector field
    #[error("schema for '{collection}' declares no vector field")]
    UnsupportedSchema {
        /// Collection whose schema lacks a vector field
        collection: String,
    },

    /// Invalid request parameter (non-positive top_k, threshold out of range)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Bug or invariant violation
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if this error is safe to retry with backoff.
    ///
    /// Only transport failures and deadline misses are retryable; all other
    /// variants are deterministic and retrying cannot change the outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_) | Error::Timeout { .. })
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Canonical kind string for wire encoding.
    ///
    /// These codes are frozen; boundary layers key status mapping off them.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "NotFound",
            Error::AlreadyExists(_) => "AlreadyExists",
            Error::TypeMismatch { .. } => "TypeMismatch",
            Error::InvalidName { .. } => "InvalidName",
            Error::InvalidSchema(_) => "InvalidSchema",
            Error::StoreUnavailable(_) => "StoreUnavailable",
            Error::Timeout { .. } => "Timeout",
            Error::DegenerateVector(_) => "DegenerateVector",
            Error::UnsupportedSchema { .. } => "UnsupportedSchema",
            Error::ConstraintViolation(_) => "ConstraintViolation",
            Error::Serialization(_) => "Serialization",
            Error::Internal(_) => "Internal",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
