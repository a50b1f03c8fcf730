//! Client for the VCluster allocation service.
//!
//! Three layers:
//!
//! - [`store`]: the [`InfoStore`] trait, the remote document store contract
//!   (whole-category documents, one round trip per call), with an HTTP
//!   implementation ([`HttpInfoStore`]) and an in-memory one
//!   ([`MemoryInfoStore`]) for tests and local development.
//! - [`api`]: [`ClientApi`], the authorization and cascade engine. Every
//!   mutating operation is gated on a [`Caller`] identity before it touches
//!   the store.
//! - [`error`]: [`ClientError`], separating policy denials from store-level
//!   conditions.
//!
//! The store offers whole-document replace only, so read-modify-write
//! sequences are not atomic across callers. That lost-update window is a
//! property of the store contract, not something this client papers over.

pub mod api;
pub mod error;
pub mod http;
pub mod memory;
pub mod store;

pub use api::{Caller, ClientApi, ConfKind};
pub use error::{ClientError, Result};
pub use http::HttpInfoStore;
pub use memory::MemoryInfoStore;
pub use store::InfoStore;
