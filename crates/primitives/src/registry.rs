//! IndexRegistry: typed collection lifecycle
//!
//! ## Design
//!
//! The registry owns the name → (type, physical namespace) mapping. It
//! holds:
//! - `Arc<StoreGateway>` for store access
//! - `RwLock<BTreeMap<String, CollectionDescriptor>>` as the in-memory map
//!
//! The map doubles as the concurrency gate: a register call reserves the
//! name with an insert-if-absent under the write lock before any store
//! call, so two concurrent creates of the same name produce exactly one
//! winner. BTreeMap keeps listings in lexicographic name order.
//!
//! ## Persistence
//!
//! Descriptors are persisted as documents in the reserved [`META_INDEX`]
//! and reloaded by [`IndexRegistry::load`] at open. Registration writes
//! the meta document before creating the physical index; failures roll
//! back in reverse order so no orphaned mapping survives.
//!
//! ## Thread Safety
//!
//! IndexRegistry is `Send + Sync` and is shared behind an `Arc`.

use kbindex_core::{
    validate_collection_name, CollectionDescriptor, Error, Result, SchemaCatalog, SchemaSpec,
    TypeTag,
};
use kbindex_core::schema::{FieldKind, FieldSpec};
use kbindex_store::StoreGateway;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Reserved physical index holding collection descriptors.
///
/// User collections can never collide with it: their physical ids always
/// carry a `{type}_` prefix drawn from the closed tag set.
pub const META_INDEX: &str = "kb_meta";

/// Field layout of the meta index.
fn meta_schema() -> SchemaSpec {
    SchemaSpec {
        fields: vec![
            FieldSpec {
                name: "name".to_string(),
                kind: FieldKind::Keyword,
            },
            FieldSpec {
                name: "type".to_string(),
                kind: FieldKind::Keyword,
            },
            FieldSpec {
                name: "physical_id".to_string(),
                kind: FieldKind::Keyword,
            },
        ],
        summary_fields: vec!["name".to_string(), "type".to_string()],
    }
}

/// Typed collection registry.
pub struct IndexRegistry {
    gateway: Arc<StoreGateway>,
    catalog: SchemaCatalog,
    descriptors: RwLock<BTreeMap<String, CollectionDescriptor>>,
}

impl IndexRegistry {
    /// Create an empty registry. Call [`load`](IndexRegistry::load) before
    /// serving reads so persisted collections are visible.
    pub fn new(gateway: Arc<StoreGateway>, catalog: SchemaCatalog) -> Self {
        IndexRegistry {
            gateway,
            catalog,
            descriptors: RwLock::new(BTreeMap::new()),
        }
    }

    /// The schema catalog collections are created against.
    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// Load persisted descriptors from the meta index.
    ///
    /// Creates the meta index on first open. Returns the number of
    /// descriptors loaded. Unparseable meta documents are skipped with a
    /// warning rather than failing the open.
    pub async fn load(&self) -> Result<usize> {
        let backends = self.gateway.acquire().await?;

        if !self
            .gateway
            .bound("meta_exists", backends.documents.index_exists(META_INDEX))
            .await?
        {
            match backends.documents.create_index(META_INDEX, &meta_schema()).await {
                Ok(()) => info!(index = META_INDEX, "created meta index"),
                // Lost the race to another opener; the index is there.
                Err(Error::AlreadyExists(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let docs = self
            .gateway
            .bound("meta_list", backends.documents.list_documents(META_INDEX))
            .await?;

        let mut map = BTreeMap::new();
        for (uid, doc) in docs {
            match serde_json::from_value::<CollectionDescriptor>(doc) {
                Ok(descriptor) => {
                    map.insert(descriptor.name.clone(), descriptor);
                }
                Err(e) => warn!(uid, error = %e, "skipping unreadable meta document"),
            }
        }
        let count = map.len();
        *self.descriptors.write() = map;
        info!(count, "loaded collection descriptors");
        Ok(count)
    }

    /// Register a collection: reserve the name, persist the descriptor,
    /// create the physical index.
    ///
    /// Fails with `AlreadyExists` if the name is taken under any type tag.
    /// On a store failure after reservation, the reservation and any
    /// persisted meta document are rolled back before the error returns.
    pub async fn register(&self, name: &str, type_tag: TypeTag) -> Result<CollectionDescriptor> {
        validate_collection_name(name)?;
        if name == META_INDEX {
            return Err(Error::InvalidName {
                name: name.to_string(),
                reason: "name is reserved".to_string(),
            });
        }

        let descriptor = CollectionDescriptor::new(name, type_tag);

        // Reservation: one winner under concurrent registration.
        {
            let mut map = self.descriptors.write();
            if map.contains_key(name) {
                return Err(Error::AlreadyExists(format!("collection '{}'", name)));
            }
            map.insert(name.to_string(), descriptor.clone());
        }

        if let Err(e) = self.persist_and_create(&descriptor).await {
            self.descriptors.write().remove(name);
            return Err(e);
        }

        info!(collection = %descriptor, "registered collection");
        Ok(descriptor)
    }

    async fn persist_and_create(&self, descriptor: &CollectionDescriptor) -> Result<()> {
        let backends = self.gateway.acquire().await?;

        let doc = serde_json::to_value(descriptor)?;
        self.gateway
            .bound(
                "meta_put",
                backends
                    .documents
                    .put_document(META_INDEX, &descriptor.name, doc),
            )
            .await?;

        let schema = self.catalog.spec_for(descriptor.type_tag);
        let created = self
            .gateway
            .bound(
                "index_create",
                backends
                    .documents
                    .create_index(&descriptor.physical_id, &schema),
            )
            .await;

        if let Err(e) = created {
            // Unwind the meta document so the mapping does not outlive the
            // missing index.
            if let Err(cleanup) = backends
                .documents
                .delete_document(META_INDEX, &descriptor.name)
                .await
            {
                warn!(
                    collection = %descriptor,
                    error = %cleanup,
                    "failed to roll back meta document"
                );
            }
            return Err(e);
        }
        Ok(())
    }

    /// Deregister a collection and drop its physical index.
    ///
    /// Fails with `NotFound` if the name is not registered. Removing the
    /// persisted meta document is the authoritative effect: if it cannot
    /// be removed the in-memory mapping is restored and the error
    /// returned, so memory and storage never disagree about whether the
    /// collection exists. Dropping the physical index afterwards is
    /// best-effort; the returned bool says whether it happened and a
    /// partial failure is logged.
    pub async fn deregister(&self, name: &str) -> Result<bool> {
        let backends = self.gateway.acquire().await?;

        let descriptor = self
            .descriptors
            .write()
            .remove(name)
            .ok_or_else(|| Error::NotFound(format!("collection '{}'", name)))?;

        if let Err(e) = self
            .gateway
            .bound(
                "meta_delete",
                backends.documents.delete_document(META_INDEX, name),
            )
            .await
        {
            self.descriptors
                .write()
                .insert(descriptor.name.clone(), descriptor);
            return Err(e);
        }

        let dropped = match self
            .gateway
            .bound(
                "index_delete",
                backends.documents.delete_index(&descriptor.physical_id),
            )
            .await
        {
            Ok(()) => true,
            Err(Error::NotFound(_)) => false,
            Err(e) => {
                warn!(collection = %descriptor, error = %e, "failed to drop physical index");
                false
            }
        };

        info!(collection = %descriptor, dropped, "deregistered collection");
        Ok(dropped)
    }

    /// Look up a collection by name, any type.
    pub fn resolve(&self, name: &str) -> Result<CollectionDescriptor> {
        self.descriptors
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("collection '{}'", name)))
    }

    /// Look up a collection and require its declared type.
    ///
    /// A name registered under a different tag fails with `TypeMismatch`,
    /// never silent coercion.
    pub fn resolve_typed(&self, name: &str, expected: TypeTag) -> Result<CollectionDescriptor> {
        let descriptor = self.resolve(name)?;
        if descriptor.type_tag != expected {
            return Err(Error::TypeMismatch {
                name: name.to_string(),
                expected,
                actual: descriptor.type_tag,
            });
        }
        Ok(descriptor)
    }

    /// All collections of one type, in lexicographic name order.
    pub fn list_by_type(&self, type_tag: TypeTag) -> Vec<CollectionDescriptor> {
        self.descriptors
            .read()
            .values()
            .filter(|d| d.type_tag == type_tag)
            .cloned()
            .collect()
    }

    /// All registered collections, in lexicographic name order.
    pub fn list_all(&self) -> Vec<CollectionDescriptor> {
        self.descriptors.read().values().cloned().collect()
    }
}
