use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::data::ClientData;
use crate::common::{AncestorChain, Authorize, Caller, ClientId, Operation, UserId};
use crate::domains::entity::{ancestor, Entity, Written};
use crate::kernel::{BaseClientStore, StoreError};

/// Clients owned by the user at `chain[0]`
pub struct Clients {
    store: Arc<dyn BaseClientStore>,
}

impl Clients {
    pub fn new(store: Arc<dyn BaseClientStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Authorize for Clients {
    async fn is_authorized(
        &self,
        caller: &Caller,
        _operation: Operation,
        chain: &AncestorChain,
    ) -> Result<bool, StoreError> {
        let owner: Option<UserId> = chain.get(0);
        Ok(owner.is_some_and(|owner| caller.is(owner)))
    }
}

#[async_trait]
impl Entity for Clients {
    type Record = ClientData;

    fn root_depth(&self) -> usize {
        1
    }

    async fn add(
        &self,
        chain: &AncestorChain,
        record: ClientData,
        at: DateTime<Utc>,
    ) -> Result<Written, StoreError> {
        let owner: UserId = ancestor(chain, 0)?;
        let client = self.store.insert_client(owner, record.into(), at).await?;
        Ok(Written {
            id: client.id.into_uuid(),
            modification_time: client.modification_time,
        })
    }

    async fn get(&self, chain: &AncestorChain) -> Result<ClientData, StoreError> {
        let owner: UserId = ancestor(chain, 0)?;
        let id: ClientId = ancestor(chain, 1)?;
        self.store.find_client(owner, id).await.map(ClientData::from)
    }

    async fn list(&self, chain: &AncestorChain) -> Result<Vec<ClientData>, StoreError> {
        let owner: UserId = ancestor(chain, 0)?;
        let clients = self.store.list_clients(owner).await?;
        Ok(clients.into_iter().map(ClientData::from).collect())
    }

    async fn update(
        &self,
        chain: &AncestorChain,
        record: ClientData,
        stamped_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<Written, StoreError> {
        let owner: UserId = ancestor(chain, 0)?;
        let id: ClientId = ancestor(chain, 1)?;
        let client = self
            .store
            .update_client(owner, id, record.into(), stamped_at, at)
            .await?;
        Ok(Written {
            id: client.id.into_uuid(),
            modification_time: client.modification_time,
        })
    }

    async fn delete(&self, chain: &AncestorChain, at: DateTime<Utc>) -> Result<(), StoreError> {
        let owner: UserId = ancestor(chain, 0)?;
        let id: ClientId = ancestor(chain, 1)?;
        self.store.delete_client(owner, id, at).await
    }
}
