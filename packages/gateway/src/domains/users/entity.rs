use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::data::UserData;
use super::models::{NewUser, UserChanges};
use crate::common::auth::{Account, DEFAULT_AUTH_LEVEL};
use crate::common::credentials::{self, Digest};
use crate::common::{AncestorChain, Authorize, Caller, Operation, UserId};
use crate::domains::entity::{ancestor, Entity, Written};
use crate::kernel::{BaseMailer, BaseUserStore, StoreError, TokenPurpose};

/// Top-level user accounts, addressed as `/users/{0}`
pub struct Users {
    store: Arc<dyn BaseUserStore>,
    mailer: Arc<dyn BaseMailer>,
}

impl Users {
    pub fn new(store: Arc<dyn BaseUserStore>, mailer: Arc<dyn BaseMailer>) -> Self {
        Self { store, mailer }
    }

    /// Super user status is re-read so a demotion takes effect immediately
    async fn is_super_user(&self, caller: &Caller) -> Result<bool, StoreError> {
        let Some(id) = caller.user_id() else {
            return Ok(false);
        };
        let user = self.store.find_user(id).await?;
        Ok(Account::from(&user).is_super_user())
    }
}

#[async_trait]
impl Authorize for Users {
    async fn is_authorized(
        &self,
        caller: &Caller,
        operation: Operation,
        chain: &AncestorChain,
    ) -> Result<bool, StoreError> {
        match operation {
            Operation::Add => Ok(true),
            Operation::List => self.is_super_user(caller).await,
            Operation::Get | Operation::Update | Operation::Delete => {
                let Some(target): Option<UserId> = chain.get(0) else {
                    return Ok(false);
                };
                if caller.is(target) {
                    return Ok(true);
                }
                self.is_super_user(caller).await
            }
        }
    }
}

#[async_trait]
impl Entity for Users {
    type Record = UserData;

    fn root_depth(&self) -> usize {
        0
    }

    async fn add(
        &self,
        _chain: &AncestorChain,
        record: UserData,
        at: DateTime<Utc>,
    ) -> Result<Written, StoreError> {
        if !record.accepted_terms {
            return Err(StoreError::TermsNotAccepted);
        }
        let username = record.username.unwrap_or_default().trim().to_string();
        if username.is_empty() {
            return Err(StoreError::rule("username is required"));
        }
        let password = record.password.unwrap_or_default();
        if password.is_empty() {
            return Err(StoreError::rule("password is required"));
        }

        let token = credentials::one_time_token();
        let user = self
            .store
            .insert_user(
                NewUser {
                    username,
                    password: Digest::password(&password),
                    accepted_terms: true,
                    accepted_news: record.accepted_news.unwrap_or(false),
                    country_code: record.country_code,
                    auth_level: DEFAULT_AUTH_LEVEL,
                    token: Some(Digest::new(&token)),
                },
                at,
            )
            .await?;

        info!(user_id = %user.id, "user registered");

        // Registration stands even if delivery fails
        if let Err(e) = self
            .mailer
            .send_token(&user.username, &token, TokenPurpose::EmailConfirmation)
            .await
        {
            warn!(user_id = %user.id, error = %e, "failed to deliver confirmation token");
        }

        Ok(Written {
            id: user.id.into_uuid(),
            modification_time: user.modification_time,
        })
    }

    async fn get(&self, chain: &AncestorChain) -> Result<UserData, StoreError> {
        let id: UserId = ancestor(chain, 0)?;
        self.store.find_user(id).await.map(UserData::from)
    }

    async fn list(&self, _chain: &AncestorChain) -> Result<Vec<UserData>, StoreError> {
        let users = self.store.list_users().await?;
        Ok(users.into_iter().map(UserData::from).collect())
    }

    async fn update(
        &self,
        chain: &AncestorChain,
        record: UserData,
        stamped_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<Written, StoreError> {
        let id: UserId = ancestor(chain, 0)?;
        let changes = UserChanges {
            username: record
                .username
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
            password: record
                .password
                .filter(|p| !p.is_empty())
                .map(|p| Digest::password(&p)),
            accepted_news: record.accepted_news,
            country_code: record.country_code,
        };

        let user = self.store.update_user(id, changes, stamped_at, at).await?;
        Ok(Written {
            id: user.id.into_uuid(),
            modification_time: user.modification_time,
        })
    }

    async fn delete(&self, chain: &AncestorChain, at: DateTime<Utc>) -> Result<(), StoreError> {
        let id: UserId = ancestor(chain, 0)?;
        self.store.delete_user(id, at).await
    }
}
