//! In-memory store for development and tests.
//!
//! Mirrors the Postgres constraints that the gateway relies on: live usernames
//! are unique and clients require a live owning user.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{BaseClientStore, BaseSessionStore, BaseUserStore, StoreError};
use crate::common::credentials::Digest;
use crate::common::{ClientId, SessionId, UserId};
use crate::domains::clients::models::{Client, ClientChanges, NewClient};
use crate::domains::sessions::Session;
use crate::domains::users::models::{NewUser, User, UserChanges};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    clients: RwLock<HashMap<ClientId, Client>>,
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn live_user(users: &HashMap<UserId, User>, id: UserId) -> Result<&User, StoreError> {
    users
        .get(&id)
        .filter(|u| !u.is_deleted())
        .ok_or(StoreError::NotFound)
}

fn live_user_mut(users: &mut HashMap<UserId, User>, id: UserId) -> Result<&mut User, StoreError> {
    users
        .get_mut(&id)
        .filter(|u| !u.is_deleted())
        .ok_or(StoreError::NotFound)
}

fn username_taken(users: &HashMap<UserId, User>, username: &str, except: Option<UserId>) -> bool {
    users
        .values()
        .any(|u| !u.is_deleted() && u.username == username && Some(u.id) != except)
}

#[async_trait]
impl BaseUserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser, at: DateTime<Utc>) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if username_taken(&users, &user.username, None) {
            return Err(StoreError::DuplicatedKey("username".to_string()));
        }

        let (token_salt, token_hash) = match user.token {
            Some(token) => (Some(token.salt), Some(token.hash)),
            None => (None, None),
        };
        let record = User {
            id: UserId::new(),
            username: user.username,
            password_salt: user.password.salt,
            password_hash: user.password.hash,
            email_confirmed: false,
            accepted_terms: user.accepted_terms,
            accepted_news: user.accepted_news,
            country_code: user.country_code,
            auth_level: user.auth_level,
            token_salt,
            token_hash,
            creation_time: at,
            modification_time: at,
            deletion_time: None,
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user(&self, id: UserId) -> Result<User, StoreError> {
        let users = self.users.read().await;
        live_user(&users, id).cloned()
    }

    async fn find_user_by_name(&self, username: &str) -> Result<User, StoreError> {
        let users = self.users.read().await;
        users
            .values()
            .find(|u| !u.is_deleted() && u.username == username)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let mut live: Vec<User> = users.values().filter(|u| !u.is_deleted()).cloned().collect();
        live.sort_by_key(|u| u.creation_time);
        Ok(live)
    }

    async fn update_user(
        &self,
        id: UserId,
        changes: UserChanges,
        stamped_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if live_user(&users, id)?.modification_time >= stamped_at {
            return Err(StoreError::Stale);
        }
        if let Some(username) = &changes.username {
            if username_taken(&users, username, Some(id)) {
                return Err(StoreError::DuplicatedKey("username".to_string()));
            }
        }

        let user = live_user_mut(&mut users, id)?;
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(password) = changes.password {
            user.password_salt = password.salt;
            user.password_hash = password.hash;
        }
        if let Some(accepted_news) = changes.accepted_news {
            user.accepted_news = accepted_news;
        }
        if let Some(country_code) = changes.country_code {
            user.country_code = Some(country_code);
        }
        user.modification_time = at;
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = live_user_mut(&mut users, id)?;
        user.deletion_time = Some(at);
        user.modification_time = at;
        Ok(())
    }

    async fn set_token(
        &self,
        id: UserId,
        token: Digest,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = live_user_mut(&mut users, id)?;
        user.token_salt = Some(token.salt);
        user.token_hash = Some(token.hash);
        user.modification_time = at;
        Ok(())
    }

    async fn confirm_email(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = live_user_mut(&mut users, id)?;
        user.email_confirmed = true;
        user.token_salt = None;
        user.token_hash = None;
        user.modification_time = at;
        Ok(())
    }

    async fn reset_password(
        &self,
        id: UserId,
        password: Digest,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = live_user_mut(&mut users, id)?;
        user.password_salt = password.salt;
        user.password_hash = password.hash;
        user.token_salt = None;
        user.token_hash = None;
        user.modification_time = at;
        Ok(())
    }
}

#[async_trait]
impl BaseClientStore for MemoryStore {
    async fn insert_client(
        &self,
        user_id: UserId,
        client: NewClient,
        at: DateTime<Utc>,
    ) -> Result<Client, StoreError> {
        {
            let users = self.users.read().await;
            if live_user(&users, user_id).is_err() {
                return Err(StoreError::Constraint("user_id".to_string()));
            }
        }

        let record = Client {
            id: ClientId::new(),
            user_id,
            name: client.name,
            notification_token: client.notification_token,
            os: client.os,
            sdk: client.sdk,
            creation_time: at,
            modification_time: at,
            deletion_time: None,
        };
        self.clients.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_client(&self, user_id: UserId, id: ClientId) -> Result<Client, StoreError> {
        let clients = self.clients.read().await;
        clients
            .get(&id)
            .filter(|c| c.user_id == user_id && c.deletion_time.is_none())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_clients(&self, user_id: UserId) -> Result<Vec<Client>, StoreError> {
        let clients = self.clients.read().await;
        let mut owned: Vec<Client> = clients
            .values()
            .filter(|c| c.user_id == user_id && c.deletion_time.is_none())
            .cloned()
            .collect();
        owned.sort_by_key(|c| c.creation_time);
        Ok(owned)
    }

    async fn update_client(
        &self,
        user_id: UserId,
        id: ClientId,
        changes: ClientChanges,
        stamped_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<Client, StoreError> {
        let mut clients = self.clients.write().await;
        let client = clients
            .get_mut(&id)
            .filter(|c| c.user_id == user_id && c.deletion_time.is_none())
            .ok_or(StoreError::NotFound)?;
        if client.modification_time >= stamped_at {
            return Err(StoreError::Stale);
        }

        if let Some(name) = changes.name {
            client.name = name;
        }
        if let Some(token) = changes.notification_token {
            client.notification_token = Some(token);
        }
        if let Some(os) = changes.os {
            client.os = Some(os);
        }
        if let Some(sdk) = changes.sdk {
            client.sdk = Some(sdk);
        }
        client.modification_time = at;
        Ok(client.clone())
    }

    async fn delete_client(
        &self,
        user_id: UserId,
        id: ClientId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut clients = self.clients.write().await;
        let client = clients
            .get_mut(&id)
            .filter(|c| c.user_id == user_id && c.deletion_time.is_none())
            .ok_or(StoreError::NotFound)?;
        client.deletion_time = Some(at);
        client.modification_time = at;
        Ok(())
    }
}

#[async_trait]
impl BaseSessionStore for MemoryStore {
    async fn create_session(
        &self,
        user_id: Option<UserId>,
        at: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let session = Session {
            id: SessionId::random(),
            user_id,
            data: Vec::new(),
            creation_time: at,
            modification_time: at,
        };
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: SessionId) -> Result<Session, StoreError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_session_data(
        &self,
        id: SessionId,
        data: Vec<u8>,
        at: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(StoreError::NotFound)?;
        session.data = data;
        session.modification_time = at;
        Ok(session.clone())
    }

    async fn take_session_data(
        &self,
        id: SessionId,
        at: DateTime<Utc>,
    ) -> Result<Vec<u8>, StoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(StoreError::NotFound)?;
        let data = std::mem::take(&mut session.data);
        if !data.is_empty() {
            session.modification_time = at;
        }
        Ok(data)
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}
