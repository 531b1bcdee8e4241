//! ItemStore: schema-validated item CRUD with write-time embedding
//!
//! Every operation resolves its collection through the registry with the
//! caller's declared type, so a tag mismatch fails before any store call.
//! Vector fields are derived here: a `{src}_vector` field is embedded from
//! the `{src}` text field when an item is created, and re-embedded when an
//! update touches the source. Callers never supply vectors.

use crate::registry::IndexRegistry;
use kbindex_core::{Error, FieldKind, Result, SchemaCatalog, SchemaSpec, TypeTag};
use kbindex_store::{Embedder, StoreGateway};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Item CRUD over registered collections.
pub struct ItemStore {
    gateway: Arc<StoreGateway>,
    registry: Arc<IndexRegistry>,
    catalog: SchemaCatalog,
    embedder: Embedder,
}

impl ItemStore {
    pub fn new(
        gateway: Arc<StoreGateway>,
        registry: Arc<IndexRegistry>,
        embedder: Embedder,
    ) -> Self {
        let catalog = *registry.catalog();
        ItemStore {
            gateway,
            registry,
            catalog,
            embedder,
        }
    }

    /// Create an item and return its store-assigned uid.
    ///
    /// The payload must match the collection schema exactly; derived
    /// vector fields are embedded from their source text before the write.
    pub async fn create(
        &self,
        collection: &str,
        type_tag: TypeTag,
        payload: Value,
    ) -> Result<String> {
        let descriptor = self.registry.resolve_typed(collection, type_tag)?;
        let schema = self.catalog.spec_for(type_tag);
        schema.validate_create(&payload)?;

        let mut doc = payload;
        self.attach_vectors(&schema, &mut doc, false).await?;

        let uid = Uuid::new_v4().to_string();
        let backends = self.gateway.acquire().await?;
        self.gateway
            .bound(
                "item_put",
                backends.documents.put_document(&descriptor.physical_id, &uid, doc),
            )
            .await?;
        debug!(collection, uid, "created item");
        Ok(uid)
    }

    /// Fetch an item by uid.
    pub async fn get(&self, collection: &str, type_tag: TypeTag, uid: &str) -> Result<Value> {
        let descriptor = self.registry.resolve_typed(collection, type_tag)?;
        let backends = self.gateway.acquire().await?;
        self.gateway
            .bound(
                "item_get",
                backends.documents.get_document(&descriptor.physical_id, uid),
            )
            .await?
            .ok_or_else(|| Error::NotFound(format!("item '{}' in '{}'", uid, collection)))
    }

    /// List all items as summary projections, in uid order.
    pub async fn list(&self, collection: &str, type_tag: TypeTag) -> Result<Vec<Value>> {
        let descriptor = self.registry.resolve_typed(collection, type_tag)?;
        let schema = self.catalog.spec_for(type_tag);
        let backends = self.gateway.acquire().await?;
        let docs = self
            .gateway
            .bound(
                "item_list",
                backends.documents.list_documents(&descriptor.physical_id),
            )
            .await?;
        Ok(docs
            .iter()
            .map(|(uid, doc)| schema.summarize(uid, doc))
            .collect())
    }

    /// Merge a partial update into an existing item.
    ///
    /// Fields absent from the payload keep their stored value. When an
    /// update touches the source text of a derived vector field, the
    /// vector is re-embedded in the same write.
    pub async fn update(
        &self,
        collection: &str,
        type_tag: TypeTag,
        uid: &str,
        partial: Value,
    ) -> Result<()> {
        let descriptor = self.registry.resolve_typed(collection, type_tag)?;
        let schema = self.catalog.spec_for(type_tag);
        schema.validate_partial(&partial)?;

        let mut doc = partial;
        self.attach_vectors(&schema, &mut doc, true).await?;

        let backends = self.gateway.acquire().await?;
        self.gateway
            .bound(
                "item_merge",
                backends
                    .documents
                    .merge_document(&descriptor.physical_id, uid, doc),
            )
            .await?;
        debug!(collection, uid, "updated item");
        Ok(())
    }

    /// Delete an item by uid. Returns whether it existed.
    pub async fn delete(&self, collection: &str, type_tag: TypeTag, uid: &str) -> Result<bool> {
        let descriptor = self.registry.resolve_typed(collection, type_tag)?;
        let backends = self.gateway.acquire().await?;
        let existed = self
            .gateway
            .bound(
                "item_delete",
                backends
                    .documents
                    .delete_document(&descriptor.physical_id, uid),
            )
            .await?;
        debug!(collection, uid, existed, "deleted item");
        Ok(existed)
    }

    /// Embed derived vector fields into `doc` in place.
    ///
    /// On create every declared vector field is derived. On a partial
    /// update only vectors whose source text appears in the payload are
    /// re-derived.
    async fn attach_vectors(&self, schema: &SchemaSpec, doc: &mut Value, partial: bool) -> Result<()> {
        for field in &schema.fields {
            if !matches!(field.kind, FieldKind::Vector { .. }) {
                continue;
            }
            let Some(src) = schema.vector_source(&field.name) else {
                continue;
            };
            let text = match doc.get(src).and_then(Value::as_str) {
                Some(text) => text.to_string(),
                // Partial update that does not touch the source text.
                None if partial => continue,
                None => {
                    return Err(Error::InvalidSchema(format!(
                        "field '{}' needs text source '{}'",
                        field.name, src
                    )))
                }
            };
            let vector = self.embedder.embed(&text).await?;
            let values: Vec<Value> = vector
                .into_iter()
                .map(|x| Value::from(f64::from(x)))
                .collect();
            if let Some(obj) = doc.as_object_mut() {
                obj.insert(field.name.clone(), Value::Array(values));
            }
        }
        Ok(())
    }
}
