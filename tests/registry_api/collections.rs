//! Collection lifecycle: registration, typed resolution, deletion.

use crate::{history_payload, open_kb};
use kbindex::prelude::*;
use kbindex::{Connector, MemoryConnector};
use std::sync::Arc;

#[tokio::test]
async fn test_create_resolve_delete_lifecycle() {
    let kb = open_kb().await;

    let d = kb
        .create_collection("notes", TypeTag::History)
        .await
        .unwrap();
    assert_eq!(d.name, "notes");
    assert_eq!(d.type_tag, TypeTag::History);
    assert_eq!(d.physical_id, "history_notes");

    assert_eq!(kb.collection("notes").unwrap(), d);

    assert!(kb.delete_collection("notes").await.unwrap());
    assert!(matches!(kb.collection("notes"), Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_one_collection_per_type_tag() {
    let kb = open_kb().await;
    for (name, tag) in [
        ("curated", TypeTag::Predefined),
        ("runs", TypeTag::History),
        ("work", TypeTag::Task),
        ("algo", TypeTag::Retrieval),
    ] {
        kb.create_collection(name, tag).await.unwrap();
    }

    for (name, tag) in [
        ("curated", TypeTag::Predefined),
        ("runs", TypeTag::History),
        ("work", TypeTag::Task),
        ("algo", TypeTag::Retrieval),
    ] {
        let listed = kb.list_collections(tag);
        assert_eq!(listed.len(), 1, "{tag}");
        assert_eq!(listed[0].name, name);
    }
    assert_eq!(kb.list_all_collections().len(), 4);
}

#[tokio::test]
async fn test_names_unique_across_types() {
    let kb = open_kb().await;
    kb.create_collection("shared", TypeTag::Task).await.unwrap();

    let dup_same_type = kb.create_collection("shared", TypeTag::Task).await;
    assert!(matches!(dup_same_type, Err(Error::AlreadyExists(_))));

    let dup_other_type = kb.create_collection("shared", TypeTag::History).await;
    assert!(matches!(dup_other_type, Err(Error::AlreadyExists(_))));
}

#[tokio::test]
async fn test_invalid_names_rejected() {
    let kb = open_kb().await;
    for name in ["", "Upper", "has space", "slash/ed", "_reserved", "kb_meta"] {
        let result = kb.create_collection(name, TypeTag::Task).await;
        assert!(
            matches!(result, Err(Error::InvalidName { .. })),
            "accepted {name:?}"
        );
    }
}

#[tokio::test]
async fn test_delete_unknown_collection() {
    let kb = open_kb().await;
    assert!(matches!(
        kb.delete_collection("ghost").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_recreate_after_delete_with_different_type() {
    let kb = open_kb().await;

    kb.create_collection("flex", TypeTag::History).await.unwrap();
    let uid = kb
        .items
        .create("flex", TypeTag::History, history_payload("h1"))
        .await
        .unwrap();

    kb.delete_collection("flex").await.unwrap();
    kb.create_collection("flex", TypeTag::Predefined)
        .await
        .unwrap();

    // Old items did not survive the delete, and the old tag no longer
    // resolves.
    assert!(kb.items.list("flex", TypeTag::Predefined).await.unwrap().is_empty());
    assert!(matches!(
        kb.items.get("flex", TypeTag::History, &uid).await,
        Err(Error::TypeMismatch { .. })
    ));
}

#[tokio::test]
async fn test_concurrent_create_single_winner() {
    let kb = Arc::new(open_kb().await);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let kb = kb.clone();
        handles.push(tokio::spawn(async move {
            kb.create_collection("contested", TypeTag::Retrieval).await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(Error::AlreadyExists(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(kb.list_collections(TypeTag::Retrieval).len(), 1);
}

#[tokio::test]
async fn test_mappings_survive_reopen() {
    let connector = Arc::new(MemoryConnector::in_memory());

    let kb = KnowledgeBase::builder()
        .dims(64)
        .connector(connector.clone())
        .open()
        .await
        .unwrap();
    kb.create_collection("algo", TypeTag::Retrieval).await.unwrap();
    kb.create_collection("runs", TypeTag::History).await.unwrap();
    kb.close().await;

    // A second knowledge base over the same backends reloads the mapping.
    let reopened = KnowledgeBase::builder()
        .dims(64)
        .connector(connector)
        .open()
        .await
        .unwrap();
    assert_eq!(reopened.list_all_collections().len(), 2);
    assert_eq!(
        reopened.collection("algo").unwrap().type_tag,
        TypeTag::Retrieval
    );
}

#[tokio::test]
async fn test_operations_reconnect_after_close() {
    let kb = open_kb().await;
    kb.create_collection("algo", TypeTag::Retrieval).await.unwrap();

    kb.close().await;
    kb.close().await; // idempotent

    // The gateway reconnects lazily on the next store call.
    kb.kv_set("ping", json!(1)).await.unwrap();
    assert_eq!(kb.kv_get("ping").await.unwrap(), Some(json!(1)));
}

#[tokio::test]
async fn test_unavailable_store_surfaces_retryable_error() {
    struct RefusingConnector;

    #[async_trait::async_trait]
    impl Connector for RefusingConnector {
        async fn connect(&self) -> Result<kbindex::Backends> {
            Err(Error::StoreUnavailable("connection refused".to_string()))
        }
    }

    let result = KnowledgeBase::builder()
        .connector(Arc::new(RefusingConnector))
        .open()
        .await;
    match result {
        Err(e) => assert!(e.is_retryable()),
        Ok(_) => panic!("open should fail when the store is unreachable"),
    }
}
