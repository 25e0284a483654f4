// Common types and utilities shared across the application

pub mod ancestors;
pub mod auth;
pub mod credentials;
pub mod entity_ids;
pub mod id;
pub mod message;

pub use ancestors::{resolve_ancestors, AncestorChain, AncestorError};
pub use auth::{Account, AuthError, Authorize, Caller, Gate, Operation};
pub use entity_ids::*;
pub use id::{Id, IdError};
pub use message::{Freshness, Message, Opened, Stamped};
