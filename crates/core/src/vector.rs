//! Cosine similarity over embedding vectors
//!
//! Shared by the brute-force ranker and the in-process document store's
//! native kNN path. Scores follow the engine-wide contract: higher = more
//! similar, cosine range [-1, 1].

use crate::error::{Error, Result};

/// Cosine similarity of two vectors.
///
/// Fails with [`Error::DegenerateVector`] when either norm is zero (the
/// embedding of empty or degenerate text) and with
/// [`Error::ConstraintViolation`] on dimension mismatch. Callers that need
/// a total scoring function substitute a deterministic fallback for the
/// degenerate case instead of propagating it.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::ConstraintViolation(format!(
            "dimension mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(Error::DegenerateVector(
            "zero-norm operand in cosine similarity".to_string(),
        ));
    }

    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}
