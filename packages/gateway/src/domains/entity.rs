//! The capability set every resource type exposes to the dispatcher.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{AncestorChain, Authorize, Id, Stamped};
use crate::kernel::StoreError;

/// Reported by successful add and update operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Written {
    pub id: Uuid,
    pub modification_time: DateTime<Utc>,
}

/// Wire representation of a resource
pub trait Record: Serialize + DeserializeOwned + Stamped + Send + Sync + 'static {
    /// Strip write-only fields before the record leaves the server.
    fn redact(&mut self) {}
}

/// A resource type reachable through the dispatcher.
///
/// Implementations may assume the chain already has the depth
/// [`Operation::expected_depth`](crate::common::Operation::expected_depth)
/// demands and that the caller passed [`Authorize::is_authorized`].
#[async_trait]
pub trait Entity: Authorize + 'static {
    type Record: Record;

    /// Ancestor count that addresses the collection
    fn root_depth(&self) -> usize;

    async fn add(
        &self,
        chain: &AncestorChain,
        record: Self::Record,
        at: DateTime<Utc>,
    ) -> Result<Written, StoreError>;

    async fn get(&self, chain: &AncestorChain) -> Result<Self::Record, StoreError>;

    async fn list(&self, chain: &AncestorChain) -> Result<Vec<Self::Record>, StoreError>;

    /// Applies `record` unless the stored record was modified at or after
    /// `stamped_at`, the envelope timestamp
    async fn update(
        &self,
        chain: &AncestorChain,
        record: Self::Record,
        stamped_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<Written, StoreError>;

    /// Soft delete stamped with the server time `at`
    async fn delete(&self, chain: &AncestorChain, at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Typed id at `position`, or `NotFound` if the chain is shorter.
pub fn ancestor<T>(chain: &AncestorChain, position: usize) -> Result<Id<T>, StoreError> {
    chain.get(position).ok_or(StoreError::NotFound)
}
