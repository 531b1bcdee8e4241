//! Native kNN path: schema-gated vector search over collections.

use crate::{assert_sorted_desc, open_kb, open_seeded_kb};
use kbindex::prelude::*;

#[tokio::test]
async fn test_search_finds_semantically_closest_item() {
    let kb = open_seeded_kb().await;

    let results = kb
        .search
        .search_text("algo", "function that does nothing", 4)
        .await
        .unwrap();

    assert!(!results.is_empty());
    assert_eq!(
        results[0].payload["desc"],
        "an empty function that does nothing"
    );
    assert_eq!(results[0].payload["code"], "def f(): pass");
    assert_sorted_desc(&results);
}

#[tokio::test]
async fn test_search_respects_k() {
    let kb = open_seeded_kb().await;
    for k in [1, 2, 3] {
        let results = kb.search.search_text("algo", "a list", k).await.unwrap();
        assert!(results.len() <= k);
    }
}

#[tokio::test]
async fn test_search_is_deterministic() {
    let kb = open_seeded_kb().await;

    let first = kb.search.search_text("algo", "sorted list", 4).await.unwrap();
    let second = kb.search.search_text("algo", "sorted list", 4).await.unwrap();

    let keys_a: Vec<&str> = first.iter().map(|r| r.key.as_str()).collect();
    let keys_b: Vec<&str> = second.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys_a, keys_b);
}

#[tokio::test]
async fn test_search_payload_excludes_stored_vector() {
    let kb = open_seeded_kb().await;
    let results = kb.search.search_text("algo", "graph", 4).await.unwrap();
    for result in &results {
        assert!(result.payload.get("desc_vector").is_none());
        assert!(result.payload.get("desc").is_some());
    }
}

#[tokio::test]
async fn test_search_requires_vector_schema() {
    let kb = open_kb().await;
    kb.create_collection("runs", TypeTag::History).await.unwrap();

    let err = kb.search.search_text("runs", "anything", 3).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedSchema { .. }));
}

#[tokio::test]
async fn test_search_unknown_collection() {
    let kb = open_kb().await;
    let err = kb.search.search_text("ghost", "q", 3).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_search_empty_collection() {
    let kb = open_kb().await;
    kb.create_collection("algo", TypeTag::Retrieval).await.unwrap();
    let results = kb.search.search_text("algo", "anything", 5).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_search_reflects_updates() {
    let kb = open_kb().await;
    kb.create_collection("algo", TypeTag::Retrieval).await.unwrap();

    let uid = kb
        .items
        .create(
            "algo",
            TypeTag::Retrieval,
            json!({"code": "v1", "desc": "knitting patterns"}),
        )
        .await
        .unwrap();

    let before = kb
        .search
        .search_text("algo", "merge sort algorithm", 1)
        .await
        .unwrap();
    let score_before = before.first().map(|r| r.score).unwrap_or(0.0);

    // Re-embedding on update moves the item toward the query.
    kb.items
        .update(
            "algo",
            TypeTag::Retrieval,
            &uid,
            json!({"desc": "merge sort algorithm"}),
        )
        .await
        .unwrap();

    let after = kb
        .search
        .search_text("algo", "merge sort algorithm", 1)
        .await
        .unwrap();
    assert!(after[0].score > score_before);
    assert!(after[0].score > 0.99);
}

#[tokio::test]
async fn test_search_vector_with_precomputed_query() {
    let kb = open_seeded_kb().await;

    // A query vector of the wrong width is rejected up front.
    let err = kb.search.search_vector("algo", &[1.0, 0.0], 2).await.unwrap_err();
    assert!(matches!(err, Error::ConstraintViolation(_)));

    let query = vec![1.0; 128];
    let results = kb.search.search_vector("algo", &query, 2).await.unwrap();
    assert!(results.len() <= 2);
    assert_sorted_desc(&results);
}

#[tokio::test]
async fn test_deleted_items_leave_the_index() {
    let kb = open_kb().await;
    kb.create_collection("algo", TypeTag::Retrieval).await.unwrap();
    let uid = kb
        .items
        .create(
            "algo",
            TypeTag::Retrieval,
            json!({"code": "c", "desc": "only item"}),
        )
        .await
        .unwrap();

    assert_eq!(kb.search.search_text("algo", "only item", 5).await.unwrap().len(), 1);

    kb.items.delete("algo", TypeTag::Retrieval, &uid).await.unwrap();
    assert!(kb.search.search_text("algo", "only item", 5).await.unwrap().is_empty());
}
