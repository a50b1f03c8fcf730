//! Schema descriptor and document conversion.
//!
//! Each entity type declares a fixed, ordered attribute list and a category
//! key. Serialization produces `{ name: { attr: value, .. } }` with exactly
//! the declared attributes; deserialization reads exactly those keys back.
//! New entity types are added by declaring a schema, not by special-casing
//! conversion code.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::SchemaError;

/// A JSON object, used both for whole-category documents
/// (`name -> attributes`) and for single-entity attribute maps.
pub type Document = serde_json::Map<String, Value>;

/// Per-type schema record: the store category an entity type lives in and
/// the ordered attribute list that defines its wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySchema {
    /// Store grouping key for this entity type, e.g. `"project"`.
    pub category: &'static str,
    /// Ordered attribute names. Only these ever appear in documents.
    pub attributes: &'static [&'static str],
}

/// An entity that can be persisted to the document store.
pub trait Persistable: Serialize + DeserializeOwned + std::fmt::Debug {
    /// The schema driving this type's document representation.
    const SCHEMA: EntitySchema;

    /// Unique key within this type's category.
    fn name(&self) -> &str;

    /// Name of the user responsible for this entity.
    fn owner(&self) -> &str;

    /// True while the entity exists only in memory (constructed, never
    /// stored). Drives create-vs-update semantics in the client.
    fn is_new(&self) -> bool;

    /// Clears the newly-defined marker after a successful store.
    fn mark_stored(&mut self);
}

/// Serializes an entity into a single-entry `{ name: { attr: value } }`
/// document. Attributes outside the declared schema are never emitted, so
/// the store stays forward compatible with in-memory extras.
pub fn to_document<E: Persistable>(entity: &E) -> Result<Document, SchemaError> {
    let value = serde_json::to_value(entity)?;
    let fields = match value {
        Value::Object(map) => map,
        _ => return Err(SchemaError::NotAnObject(entity.name().to_string())),
    };

    let mut attrs = Document::new();
    for &attr in E::SCHEMA.attributes {
        attrs.insert(
            attr.to_string(),
            fields.get(attr).cloned().unwrap_or(Value::Null),
        );
    }

    let mut doc = Document::new();
    doc.insert(entity.name().to_string(), Value::Object(attrs));
    Ok(doc)
}

/// Reconstructs an entity from a single-entry document, reading exactly the
/// declared schema attributes. A declared attribute absent from the document
/// is a [`SchemaError::MissingField`].
pub fn from_document<E: Persistable>(doc: &Document) -> Result<E, SchemaError> {
    if doc.len() != 1 {
        return Err(SchemaError::NotSingleEntry(doc.len()));
    }
    let (name, entry) = match doc.iter().next() {
        Some(pair) => pair,
        None => return Err(SchemaError::NotSingleEntry(0)),
    };
    let fields = entry
        .as_object()
        .ok_or_else(|| SchemaError::NotAnObject(name.clone()))?;

    for &attr in E::SCHEMA.attributes {
        if !fields.contains_key(attr) {
            return Err(SchemaError::MissingField {
                name: name.clone(),
                field: attr,
            });
        }
    }

    let mut trimmed = Document::new();
    for &attr in E::SCHEMA.attributes {
        if let Some(v) = fields.get(attr) {
            trimmed.insert(attr.to_string(), v.clone());
        }
    }
    Ok(serde_json::from_value(Value::Object(trimmed))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::User;

    #[test]
    fn document_round_trip() {
        let user = User::new("alice", "Alice", "Adams", "alice@lab.edu", "Example Lab");
        let doc = to_document(&user).unwrap();

        assert_eq!(doc.len(), 1);
        let attrs = doc.get("alice").unwrap().as_object().unwrap();
        assert_eq!(attrs.len(), User::SCHEMA.attributes.len());
        assert_eq!(attrs.get("email").unwrap(), "alice@lab.edu");

        let back: User = from_document(&doc).unwrap();
        assert_eq!(back.name, "alice");
        assert_eq!(back.organization, "Example Lab");
        // Reconstructed entities are updates, not creates.
        assert!(!back.is_new());
    }

    #[test]
    fn serialization_never_leaks_undeclared_fields() {
        let user = User::new("bob", "Bob", "Baker", "bob@lab.edu", "Example Lab");
        let doc = to_document(&user).unwrap();
        let attrs = doc.get("bob").unwrap().as_object().unwrap();
        for key in attrs.keys() {
            assert!(
                User::SCHEMA.attributes.contains(&key.as_str()),
                "undeclared attribute {key} leaked into document"
            );
        }
    }

    #[test]
    fn missing_declared_field_is_an_error() {
        let user = User::new("carol", "Carol", "Clay", "carol@lab.edu", "Example Lab");
        let mut doc = to_document(&user).unwrap();
        doc.get_mut("carol")
            .unwrap()
            .as_object_mut()
            .unwrap()
            .remove("email");

        let err = from_document::<User>(&doc).unwrap_err();
        match err {
            SchemaError::MissingField { name, field } => {
                assert_eq!(name, "carol");
                assert_eq!(field, "email");
            }
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn multi_entry_document_rejected() {
        let a = to_document(&User::new("a", "A", "A", "a@x", "X")).unwrap();
        let mut doc = a;
        let b = to_document(&User::new("b", "B", "B", "b@x", "X")).unwrap();
        doc.extend(b);
        assert!(matches!(
            from_document::<User>(&doc),
            Err(SchemaError::NotSingleEntry(2))
        ));
    }
}
