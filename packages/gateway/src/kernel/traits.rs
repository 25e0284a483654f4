// Trait definitions for dependency injection
//
// Infrastructure traits only. Authorization rules and resource semantics live
// in the domains; these describe what the persistent store must provide.
//
// Naming convention: Base* for trait names (e.g., BaseUserStore, BaseMailer)

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{StoreError, TokenPurpose};
use crate::common::credentials::Digest;
use crate::common::{ClientId, SessionId, UserId};
use crate::domains::clients::models::{Client, ClientChanges, NewClient};
use crate::domains::sessions::Session;
use crate::domains::users::models::{NewUser, User, UserChanges};

// =============================================================================
// User Store
// =============================================================================

/// Soft-deleted users behave as missing for every read.
#[async_trait]
pub trait BaseUserStore: Send + Sync {
    /// Usernames are unique among live users.
    async fn insert_user(&self, user: NewUser, at: DateTime<Utc>) -> Result<User, StoreError>;

    async fn find_user(&self, id: UserId) -> Result<User, StoreError>;

    async fn find_user_by_name(&self, username: &str) -> Result<User, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Fails with `Stale` unless the stored modification time is strictly
    /// before `stamped_at`. The check and the write are one atomic step.
    async fn update_user(
        &self,
        id: UserId,
        changes: UserChanges,
        stamped_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<User, StoreError>;

    async fn delete_user(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Replace the outstanding one-time token
    async fn set_token(&self, id: UserId, token: Digest, at: DateTime<Utc>)
        -> Result<(), StoreError>;

    /// Mark the email confirmed and consume the outstanding token
    async fn confirm_email(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Set a new password and consume the outstanding token
    async fn reset_password(
        &self,
        id: UserId,
        password: Digest,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Reachability check for the health route
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// =============================================================================
// Client Store
// =============================================================================

/// Clients are always addressed through their owning user.
#[async_trait]
pub trait BaseClientStore: Send + Sync {
    /// Fails with `Constraint` when the owning user does not exist.
    async fn insert_client(
        &self,
        user_id: UserId,
        client: NewClient,
        at: DateTime<Utc>,
    ) -> Result<Client, StoreError>;

    async fn find_client(&self, user_id: UserId, id: ClientId) -> Result<Client, StoreError>;

    async fn list_clients(&self, user_id: UserId) -> Result<Vec<Client>, StoreError>;

    /// Same staleness rule as [`BaseUserStore::update_user`]
    async fn update_client(
        &self,
        user_id: UserId,
        id: ClientId,
        changes: ClientChanges,
        stamped_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<Client, StoreError>;

    async fn delete_client(
        &self,
        user_id: UserId,
        id: ClientId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

// =============================================================================
// Session Store
// =============================================================================

#[async_trait]
pub trait BaseSessionStore: Send + Sync {
    async fn create_session(
        &self,
        user_id: Option<UserId>,
        at: DateTime<Utc>,
    ) -> Result<Session, StoreError>;

    async fn find_session(&self, id: SessionId) -> Result<Session, StoreError>;

    async fn update_session_data(
        &self,
        id: SessionId,
        data: Vec<u8>,
        at: DateTime<Utc>,
    ) -> Result<Session, StoreError>;

    /// Return the side-data and clear it in one atomic step
    async fn take_session_data(&self, id: SessionId, at: DateTime<Utc>)
        -> Result<Vec<u8>, StoreError>;

    async fn delete_session(&self, id: SessionId) -> Result<(), StoreError>;
}

// =============================================================================
// Mailer
// =============================================================================

#[async_trait]
pub trait BaseMailer: Send + Sync {
    /// Deliver a one-time token to the account's email address
    async fn send_token(&self, to: &str, token: &str, purpose: TokenPurpose)
        -> anyhow::Result<()>;
}
