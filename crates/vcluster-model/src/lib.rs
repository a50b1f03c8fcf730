//! Domain model for the VCluster allocation service.
//!
//! Every entity the service knows about lives here: users, projects, compute
//! resources, allocations, node descriptions, clusters, software
//! environments, balancing policies, and cluster-instantiation requests.
//! Entities are plain serde structs; the store representation is driven by a
//! per-type [`EntitySchema`] so the wire format never picks up fields the
//! schema does not declare.
//!
//! Authorization lives one layer up, in `vcluster-client`. This crate only
//! enforces the invariants an entity can guarantee on its own (owner is
//! always a project member, list fields stay de-duplicated, state machines
//! only advance along declared edges).

pub mod cluster;
pub mod error;
pub mod identity;
pub mod request;
pub mod resources;
pub mod schema;

pub use cluster::{AppRole, Cluster, Environment, KillOrder, Nodeinfo, Nodeset};
pub use error::SchemaError;
pub use identity::{Project, User};
pub use request::{Policy, Provisioner, Request, RequestAction, RequestState};
pub use resources::{Allocation, AllocationState, PrivateToken, Resource};
pub use schema::{from_document, to_document, Document, EntitySchema, Persistable};
