//! Schema-level error types.

use thiserror::Error;

/// Errors raised while mapping entities to and from store documents.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A declared schema attribute was absent from the stored document.
    #[error("entity '{name}' is missing declared field '{field}'")]
    MissingField {
        /// Name of the entity being reconstructed.
        name: String,
        /// The absent attribute.
        field: &'static str,
    },

    /// Document did not contain exactly one named entry.
    #[error("expected a single-entry document, found {0} entries")]
    NotSingleEntry(usize),

    /// The named entry was not an attribute mapping.
    #[error("entry '{0}' is not an attribute mapping")]
    NotAnObject(String),

    /// Underlying serde failure (wrong attribute type, etc.).
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
