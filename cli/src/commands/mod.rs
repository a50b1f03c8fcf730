//! Per-entity command handlers.
//!
//! Each module maps its subcommand enum onto `ClientApi` calls and prints
//! results in the requested format. Exit-code mapping happens in `main`.

pub mod allocation;
pub mod cluster;
pub mod config;
pub mod environment;
pub mod nodeinfo;
pub mod nodeset;
pub mod pairing;
pub mod project;
pub mod request;
pub mod resource;
pub mod user;
