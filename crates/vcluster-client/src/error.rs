//! Client error types.

use thiserror::Error;
use vcluster_model::SchemaError;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by the store client and authorization engine.
///
/// Policy denials are a single kind, distinct from store-level conditions.
/// Nothing here is retried automatically; retry policy belongs to callers.
#[derive(Error, Debug)]
pub enum ClientError {
    /// A policy gate refused the operation for this caller.
    #[error("authorization denied for '{user}': {reason}")]
    AuthorizationDenied {
        /// The offending caller.
        user: String,
        /// Human-readable reason.
        reason: String,
    },

    /// A get/delete/cascade step referenced a name absent from its category.
    #[error("no such entity: {0}")]
    EntityMissing(String),

    /// Create attempted over an existing name.
    #[error("entity already exists: {0}")]
    EntityExists(String),

    /// Update attempted on a name absent from the store.
    #[error("cannot update missing entity: {0}")]
    EntityUpdateMissing(String),

    /// Transport-level failure talking to the store, propagated unchanged.
    #[error("store connection failure: {0}")]
    Connection(String),

    /// Pairing code valid but credentials not yet issued; retry later.
    #[error("pairing not yet satisfied for code '{0}'")]
    PairingNotReady(String),

    /// Malformed store document.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// An embedded base64 payload could not be decoded.
    #[error("payload decode error: {0}")]
    Decode(String),
}

impl ClientError {
    /// Shorthand for a policy denial.
    pub fn denied(user: impl Into<String>, reason: impl Into<String>) -> Self {
        ClientError::AuthorizationDenied {
            user: user.into(),
            reason: reason.into(),
        }
    }

    /// True for [`ClientError::AuthorizationDenied`].
    pub fn is_denied(&self) -> bool {
        matches!(self, ClientError::AuthorizationDenied { .. })
    }

    /// True when the failure is a create-conflict or update-of-missing.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ClientError::EntityExists(_) | ClientError::EntityUpdateMissing(_)
        )
    }

    /// True when a referenced entity was absent.
    pub fn is_missing(&self) -> bool {
        matches!(self, ClientError::EntityMissing(_))
    }
}
