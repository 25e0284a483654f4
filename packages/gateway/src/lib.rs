// Resource Gateway - API Core
//
// This crate is the authentication/authorization front door for a hierarchical
// resource API. Every request is mapped to a caller identity, an ancestor chain
// resolved from the URL and a permission decision before any domain operation runs.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
