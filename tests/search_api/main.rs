//! Search API Test Suite
//!
//! End-to-end coverage of both search paths through the `KnowledgeBase`
//! facade: native kNN over vector-bearing collections and brute-force
//! ranking of key-value entries, including the determinism properties
//! both paths guarantee.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all search tests
//! cargo test --test search_api
//!
//! # Run the native-path tests only
//! cargo test --test search_api knn::
//! ```

use kbindex::prelude::*;
use once_cell::sync::Lazy;

// Test modules
pub mod knn;
pub mod rank;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
});

/// Open an in-memory knowledge base with small vectors for fast tests.
pub async fn open_kb() -> KnowledgeBase {
    Lazy::force(&TRACING);
    KnowledgeBase::builder()
        .dims(128)
        .open()
        .await
        .expect("failed to open knowledge base")
}

/// Open a knowledge base with a seeded retrieval collection.
pub async fn open_seeded_kb() -> KnowledgeBase {
    let kb = open_kb().await;
    kb.create_collection("algo", TypeTag::Retrieval).await.unwrap();
    for (code, desc) in [
        ("def f(): pass", "an empty function that does nothing"),
        ("def bs(xs, t): ...", "binary search over a sorted list"),
        ("def dfs(g, s): ...", "depth first traversal of a graph"),
        ("def qs(xs): ...", "quick sort a list of numbers"),
    ] {
        kb.items
            .create("algo", TypeTag::Retrieval, json!({"code": code, "desc": desc}))
            .await
            .unwrap();
    }
    kb
}

/// Assert scores are non-increasing.
pub fn assert_sorted_desc(results: &[SearchResult]) {
    for window in results.windows(2) {
        assert!(
            window[0].score >= window[1].score,
            "scores out of order: {} before {}",
            window[0].score,
            window[1].score
        );
    }
}
