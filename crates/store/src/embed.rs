//! Text embedding off the request path
//!
//! Embedding is CPU-bound; running it inline on an async worker would let
//! one slow embed head-of-line-block every concurrent request. [`Embedder`]
//! wraps a [`TextEmbedder`] behind a bounded `spawn_blocking` pool: the
//! semaphore caps concurrent blocking embeds, the deadline caps each call.
//!
//! [`HashEmbedder`] is the in-process default: a deterministic token-hash
//! bag model. It is not a semantic model, but it is deterministic, cheap,
//! and produces non-negative components (cosine scores in [0, 1]), which
//! is what tests and embedded deployments need. Production deployments
//! inject a real model through the same trait.

use kbindex_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Default number of concurrently running embed calls.
pub const DEFAULT_EMBED_POOL_WIDTH: usize = 4;

/// Text → fixed-length vector. Deterministic: equal text, equal vector.
///
/// Implementations are CPU-bound and synchronous; the engine schedules
/// them through [`Embedder`] rather than calling them on async workers.
pub trait TextEmbedder: Send + Sync {
    /// Output dimensionality, fixed per instance.
    fn dimension(&self) -> usize;

    /// Embed one text.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Bounded async front-end over a [`TextEmbedder`].
#[derive(Clone)]
pub struct Embedder {
    inner: Arc<dyn TextEmbedder>,
    permits: Arc<Semaphore>,
    deadline: Duration,
}

impl Embedder {
    /// Wrap an embedder with a concurrency bound and a per-call deadline.
    pub fn new(inner: Arc<dyn TextEmbedder>, pool_width: usize, deadline: Duration) -> Self {
        Embedder {
            inner,
            permits: Arc::new(Semaphore::new(pool_width.max(1))),
            deadline,
        }
    }

    /// Output dimensionality of the wrapped embedder.
    pub fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    /// Embed text on the blocking pool, bounded by the configured deadline.
    ///
    /// The semaphore permit is held for the duration of the blocking call,
    /// so at most `pool_width` embeds occupy blocking threads at once;
    /// waiting for a permit counts against the deadline.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let work = async {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| Error::Internal("embed pool closed".to_string()))?;
            let inner = self.inner.clone();
            let text = text.to_string();
            tokio::task::spawn_blocking(move || inner.embed(&text))
                .await
                .map_err(|e| Error::Internal(format!("embed task panicked: {}", e)))?
        };

        match tokio::time::timeout(self.deadline, work).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                op: "embed".to_string(),
                elapsed_ms: self.deadline.as_millis() as u64,
            }),
        }
    }
}

/// Deterministic token-hash bag embedder.
///
/// Tokenizes on non-alphanumerics, lowercases, and accumulates each
/// token's FNV-1a hash into a fixed-width histogram. Texts sharing tokens
/// land near each other; empty text yields the zero vector, which cosine
/// treats as degenerate.
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    /// Create an embedder with the given output dimensionality.
    pub fn new(dims: usize) -> Self {
        HashEmbedder { dims: dims.max(1) }
    }

    fn fnv1a(token: &str) -> u64 {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01b3;
        let mut hash = OFFSET;
        for byte in token.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(PRIME);
        }
        hash
    }
}

impl TextEmbedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dims
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dims];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let slot = (Self::fnv1a(&token.to_lowercase()) % self.dims as u64) as usize;
            vector[slot] += 1.0;
        }
        Ok(vector)
    }
}
