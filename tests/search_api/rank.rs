//! Brute-force path: ranking key-value entries.

use crate::{assert_sorted_desc, open_kb};
use kbindex::prelude::*;
use kbindex::{Embedder, HashEmbedder, SimilarityRanker};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_rank_kv_entries_through_facade() {
    let kb = open_kb().await;
    kb.kv_set("note:sort", json!("quick sort a list of numbers"))
        .await
        .unwrap();
    kb.kv_set("note:idle", json!("an empty function that does nothing"))
        .await
        .unwrap();
    kb.kv_set("note:misc", json!("watering houseplants on sundays"))
        .await
        .unwrap();

    let results = kb
        .rank("function doing nothing", &RankParams::new(3, 0.0))
        .await
        .unwrap();

    assert!(!results.is_empty());
    assert_eq!(results[0].key, "note:idle");
    assert_sorted_desc(&results);
}

#[tokio::test]
async fn test_rank_by_key_target() {
    let kb = open_kb().await;
    kb.kv_set("binary search notes", json!({"body": 1})).await.unwrap();
    kb.kv_set("gardening notes", json!({"body": 2})).await.unwrap();

    let results = kb
        .rank(
            "binary search",
            &RankParams::new(1, 0.0).with_target(SearchTarget::Key),
        )
        .await
        .unwrap();
    assert_eq!(results[0].key, "binary search notes");
}

#[tokio::test]
async fn test_rank_threshold_filters() {
    let kb = open_kb().await;
    kb.kv_set("exact", json!("merge intervals")).await.unwrap();
    kb.kv_set("other", json!("unrelated pottery wheel")).await.unwrap();

    let loose = kb
        .rank("merge intervals", &RankParams::new(10, -1.0))
        .await
        .unwrap();
    let strict = kb
        .rank("merge intervals", &RankParams::new(10, 0.99))
        .await
        .unwrap();

    assert!(strict.len() < loose.len());
    assert_eq!(strict[0].key, "exact");
    for result in &strict {
        assert!(result.score >= 0.99);
    }
}

#[tokio::test]
async fn test_rank_invalid_params_fail_fast() {
    let kb = open_kb().await;
    assert!(kb.rank("q", &RankParams::new(0, 0.0)).await.is_err());
    assert!(kb.rank("q", &RankParams::new(1, 2.0)).await.is_err());
    assert!(kb.rank("q", &RankParams::new(1, f32::NAN)).await.is_err());
}

#[tokio::test]
async fn test_rank_empty_store() {
    let kb = open_kb().await;
    let results = kb.rank("anything", &RankParams::new(5, 0.0)).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_rank_is_deterministic() {
    let kb = open_kb().await;
    for i in 0..10 {
        kb.kv_set(&format!("k{i}"), json!(format!("entry number {i}")))
            .await
            .unwrap();
    }

    let first = kb.rank("entry number", &RankParams::new(10, 0.0)).await.unwrap();
    let second = kb.rank("entry number", &RankParams::new(10, 0.0)).await.unwrap();

    let keys_a: Vec<&str> = first.iter().map(|r| r.key.as_str()).collect();
    let keys_b: Vec<&str> = second.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys_a, keys_b);
}

// =============================================================================
// PROPERTIES
// =============================================================================

fn test_ranker() -> SimilarityRanker {
    SimilarityRanker::new(Embedder::new(
        Arc::new(HashEmbedder::new(128)),
        4,
        Duration::from_secs(5),
    ))
}

fn word() -> impl Strategy<Value = String> {
    proptest::sample::select(vec![
        "sort", "search", "graph", "tree", "list", "hash", "merge", "binary",
        "empty", "function", "traverse", "number",
    ])
    .prop_map(str::to_string)
}

fn entry_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(word(), 1..6).prop_map(|words| words.join(" "))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The result *set* does not depend on input order, and every score
    /// clears the threshold.
    #[test]
    fn prop_rank_set_is_permutation_invariant(
        texts in proptest::collection::vec(entry_text(), 1..12),
        threshold in 0.0f32..0.8f32,
        query in entry_text(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let ranker = test_ranker();
            let entries: Vec<(String, serde_json::Value)> = texts
                .iter()
                .enumerate()
                .map(|(i, t)| (format!("k{i}"), json!(t)))
                .collect();
            let mut reversed = entries.clone();
            reversed.reverse();

            let params = RankParams::new(entries.len().max(1), threshold);
            let forward = ranker.rank(&query, &entries, &params).await.unwrap();
            let backward = ranker.rank(&query, &reversed, &params).await.unwrap();

            let mut keys_a: Vec<&str> = forward.iter().map(|r| r.key.as_str()).collect();
            let mut keys_b: Vec<&str> = backward.iter().map(|r| r.key.as_str()).collect();
            keys_a.sort_unstable();
            keys_b.sort_unstable();
            prop_assert_eq!(keys_a, keys_b);

            for result in forward.iter().chain(backward.iter()) {
                prop_assert!(result.score >= threshold);
                prop_assert!(result.score <= 1.0 + 1e-5);
            }
            Ok(())
        })?;
    }

    /// top_k bounds the result count and never changes the leading results.
    #[test]
    fn prop_top_k_is_a_prefix(
        texts in proptest::collection::vec(entry_text(), 2..12),
        query in entry_text(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let ranker = test_ranker();
            let entries: Vec<(String, serde_json::Value)> = texts
                .iter()
                .enumerate()
                .map(|(i, t)| (format!("k{i}"), json!(t)))
                .collect();

            let full = ranker
                .rank(&query, &entries, &RankParams::new(entries.len(), 0.0))
                .await
                .unwrap();
            let truncated = ranker
                .rank(&query, &entries, &RankParams::new(1, 0.0))
                .await
                .unwrap();

            prop_assert!(truncated.len() <= 1);
            if let (Some(first), Some(top)) = (full.first(), truncated.first()) {
                prop_assert_eq!(&first.key, &top.key);
            }
            Ok(())
        })?;
    }
}
