//! SimilarityRanker: brute-force ranking of key-value entries
//!
//! The fallback search path for stores without a native vector index.
//! Every candidate is embedded per request, so cost is linear in corpus
//! size; the native path in [`vector_search`](crate::vector_search) is
//! preferred whenever the collection schema declares a vector field.
//!
//! ## Determinism
//!
//! Output is ordered by score descending with a stable sort, so equal
//! scores keep the input order. Callers that feed entries in key order
//! (the [`KvStore::entries`] contract) get fully deterministic results.
//!
//! [`KvStore::entries`]: kbindex_store::KvStore::entries

use kbindex_core::{cosine_similarity, Error, RankParams, Result, SearchResult, SearchTarget};
use kbindex_store::{Embedder, KvStore};
use serde_json::Value;
use tracing::debug;

/// Brute-force cosine ranker over (key, value) entries.
#[derive(Clone)]
pub struct SimilarityRanker {
    embedder: Embedder,
}

impl SimilarityRanker {
    pub fn new(embedder: Embedder) -> Self {
        SimilarityRanker { embedder }
    }

    /// Rank entries against a text query.
    ///
    /// Embeds the query once and each entry's target text once, scores by
    /// cosine similarity, drops entries below the threshold, and returns
    /// at most `top_k` results in score-descending order. An entry whose
    /// embedding is degenerate (zero norm) scores 0.0 instead of failing
    /// the whole request.
    pub async fn rank(
        &self,
        query: &str,
        entries: &[(String, Value)],
        params: &RankParams,
    ) -> Result<Vec<SearchResult>> {
        params.validate()?;

        let query_vec = self.embedder.embed(query).await?;

        let mut results = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let text = match params.target {
                SearchTarget::Key => key.clone(),
                SearchTarget::Value => canonical_text(value)?,
            };
            let entry_vec = self.embedder.embed(&text).await?;
            let score = match cosine_similarity(&query_vec, &entry_vec) {
                Ok(s) => s,
                Err(Error::DegenerateVector(_)) => 0.0,
                Err(e) => return Err(e),
            };
            if score >= params.threshold {
                results.push(SearchResult::new(key.clone(), value.clone(), score));
            }
        }

        // Stable sort keeps input order for equal scores.
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(params.top_k);
        debug!(query, hits = results.len(), "ranked entries");
        Ok(results)
    }

    /// Rank a snapshot of a key-value store.
    pub async fn rank_store(
        &self,
        store: &dyn KvStore,
        query: &str,
        params: &RankParams,
    ) -> Result<Vec<SearchResult>> {
        let entries = store.entries().await?;
        self.rank(query, &entries, params).await
    }
}

/// Text form of a value for embedding.
///
/// Strings embed as themselves; other values embed as their canonical
/// JSON serialization, which serde_json renders deterministically (object
/// keys in insertion order from a deterministic source).
fn canonical_text(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string(other)?),
    }
}
