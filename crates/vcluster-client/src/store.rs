//! The store contract and typed access helpers.

use async_trait::async_trait;
use tracing::debug;
use vcluster_model::{from_document, to_document, Document, Persistable};

use crate::error::Result;

/// Remote document store operations.
///
/// A category is one whole JSON document `{ entity_name: { attr: value } }`.
/// Each call is a single request/response round trip; there is no partial or
/// field-level update primitive and no cross-call atomicity.
#[async_trait]
pub trait InfoStore: Send + Sync {
    /// Fetches a whole category document. A category that has never been
    /// written reads as empty.
    async fn get_all(&self, category: &str) -> Result<Document>;

    /// Replaces a whole category document.
    async fn replace_all(&self, category: &str, doc: Document) -> Result<()>;

    /// Fetches one named entity's attribute map, or `None` when absent.
    async fn get_one(&self, category: &str, name: &str) -> Result<Option<Document>>;

    /// Deletes one named entity. Absent =>
    /// [`ClientError::EntityMissing`](crate::error::ClientError::EntityMissing).
    async fn delete_one(&self, category: &str, name: &str) -> Result<()>;

    /// Asks the service to set up an X.509 pairing for `common_name`.
    /// Returns the one-time pairing code.
    async fn request_pairing(&self, common_name: &str) -> Result<String>;

    /// Retrieves `(cert, key)` for a pairing code. Until the service has
    /// satisfied the request this returns
    /// [`ClientError::PairingNotReady`](crate::error::ClientError::PairingNotReady);
    /// such calls are harmless and may be repeated.
    async fn get_pairing(&self, code: &str) -> Result<(String, String)>;
}

/// Lists every entity in a type's category.
pub async fn list_entities<E: Persistable>(store: &dyn InfoStore) -> Result<Vec<E>> {
    let doc = store.get_all(E::SCHEMA.category).await?;
    let mut entities = Vec::with_capacity(doc.len());
    for (name, attrs) in doc {
        let mut single = Document::new();
        single.insert(name, attrs);
        entities.push(from_document(&single)?);
    }
    debug!(
        category = E::SCHEMA.category,
        count = entities.len(),
        "listed entities"
    );
    Ok(entities)
}

/// Fetches one entity by name, `None` when absent.
pub async fn get_entity<E: Persistable>(store: &dyn InfoStore, name: &str) -> Result<Option<E>> {
    match store.get_one(E::SCHEMA.category, name).await? {
        Some(attrs) => {
            let mut single = Document::new();
            single.insert(name.to_string(), serde_json::Value::Object(attrs));
            Ok(Some(from_document(&single)?))
        }
        None => Ok(None),
    }
}

/// Deletes one entity by name.
pub async fn delete_entity<E: Persistable>(store: &dyn InfoStore, name: &str) -> Result<()> {
    debug!(category = E::SCHEMA.category, name, "deleting entity");
    store.delete_one(E::SCHEMA.category, name).await
}

/// Writes one entity into its category document.
///
/// This is a read-modify-replace of the whole category: two callers updating
/// different entities in the same category can lose one another's write. The
/// store exposes nothing finer-grained, so the window is inherent.
pub async fn put_entity<E: Persistable>(store: &dyn InfoStore, entity: &E) -> Result<()> {
    let mut all = store.get_all(E::SCHEMA.category).await?;
    for (name, attrs) in to_document(entity)? {
        all.insert(name, attrs);
    }
    debug!(
        category = E::SCHEMA.category,
        name = entity.name(),
        "storing entity"
    );
    store.replace_all(E::SCHEMA.category, all).await
}

/// Existence probe without deserialization.
pub async fn entity_exists<E: Persistable>(store: &dyn InfoStore, name: &str) -> Result<bool> {
    Ok(store.get_one(E::SCHEMA.category, name).await?.is_some())
}
