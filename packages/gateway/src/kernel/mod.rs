//! Kernel module - store and delivery collaborators behind the gateway.

pub mod deps;
pub mod error;
pub mod mailer;
pub mod memory_store;
pub mod postgres_store;
pub mod traits;

pub use deps::ServerDeps;
pub use error::StoreError;
pub use mailer::{LogMailer, TokenPurpose};
pub use memory_store::MemoryStore;
pub use postgres_store::PostgresStore;
pub use traits::*;
