//! Registry API Test Suite
//!
//! End-to-end coverage of collection lifecycle and item CRUD through the
//! `KnowledgeBase` facade: typed registration, name uniqueness across
//! types, persistence of the name mapping, and schema-validated item
//! operations with write-time embedding.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all registry tests
//! cargo test --test registry_api
//!
//! # Run collection lifecycle tests only
//! cargo test --test registry_api collections::
//! ```

use kbindex::prelude::*;
use once_cell::sync::Lazy;

// Test modules
pub mod collections;

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
        .dims(64)
        .open()
        .await
        .expect("failed to open knowledge base")
}

/// A full valid payload for a history item.
pub fn history_payload(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "question": format!("question for {name}"),
        "code": format!("print('{name}')"),
    })
}

/// A full valid payload for a retrieval item.
pub fn retrieval_payload(code: &str, desc: &str) -> serde_json::Value {
    json!({"code": code, "desc": desc})
}
