//! Postgres-backed store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{BaseClientStore, BaseSessionStore, BaseUserStore, StoreError};
use crate::common::credentials::Digest;
use crate::common::{ClientId, SessionId, UserId};
use crate::domains::clients::models::{Client, ClientChanges, NewClient};
use crate::domains::sessions::Session;
use crate::domains::users::models::{NewUser, User, UserChanges};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending migrations
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Internal(Box::new(e)))
    }
}

/// `UPDATE` affecting no live row becomes `NotFound`
fn expect_one(result: sqlx::postgres::PgQueryResult) -> Result<(), StoreError> {
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl BaseUserStore for PostgresStore {
    async fn insert_user(&self, user: NewUser, at: DateTime<Utc>) -> Result<User, StoreError> {
        let (token_salt, token_hash) = match user.token {
            Some(token) => (Some(token.salt), Some(token.hash)),
            None => (None, None),
        };

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, username, password_salt, password_hash, accepted_terms, accepted_news,
                country_code, auth_level, token_salt, token_hash, creation_time, modification_time
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING *
            "#,
        )
        .bind(UserId::new())
        .bind(&user.username)
        .bind(&user.password.salt)
        .bind(&user.password.hash)
        .bind(user.accepted_terms)
        .bind(user.accepted_news)
        .bind(&user.country_code)
        .bind(user.auth_level)
        .bind(token_salt)
        .bind(token_hash)
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn find_user(&self, id: UserId) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deletion_time IS NULL")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn find_user_by_name(&self, username: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = $1 AND deletion_time IS NULL",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE deletion_time IS NULL ORDER BY creation_time",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn update_user(
        &self,
        id: UserId,
        changes: UserChanges,
        stamped_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let (password_salt, password_hash) = match changes.password {
            Some(password) => (Some(password.salt), Some(password.hash)),
            None => (None, None),
        };

        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                password_salt = COALESCE($3, password_salt),
                password_hash = COALESCE($4, password_hash),
                accepted_news = COALESCE($5, accepted_news),
                country_code = COALESCE($6, country_code),
                modification_time = $7
            WHERE id = $1 AND deletion_time IS NULL AND modification_time < $8
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.username)
        .bind(password_salt)
        .bind(password_hash)
        .bind(changes.accepted_news)
        .bind(changes.country_code)
        .bind(at)
        .bind(stamped_at)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(user) => Ok(user),
            // No row matched: either gone or modified since the envelope
            None => {
                self.find_user(id).await?;
                Err(StoreError::Stale)
            }
        }
    }

    async fn delete_user(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET deletion_time = $2, modification_time = $2 \
             WHERE id = $1 AND deletion_time IS NULL",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        expect_one(result)
    }

    async fn set_token(
        &self,
        id: UserId,
        token: Digest,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET token_salt = $2, token_hash = $3, modification_time = $4 \
             WHERE id = $1 AND deletion_time IS NULL",
        )
        .bind(id)
        .bind(token.salt)
        .bind(token.hash)
        .bind(at)
        .execute(&self.pool)
        .await?;
        expect_one(result)
    }

    async fn confirm_email(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET email_confirmed = TRUE, token_salt = NULL, token_hash = NULL, \
             modification_time = $2 WHERE id = $1 AND deletion_time IS NULL",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        expect_one(result)
    }

    async fn reset_password(
        &self,
        id: UserId,
        password: Digest,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET password_salt = $2, password_hash = $3, token_salt = NULL, \
             token_hash = NULL, modification_time = $4 WHERE id = $1 AND deletion_time IS NULL",
        )
        .bind(id)
        .bind(password.salt)
        .bind(password.hash)
        .bind(at)
        .execute(&self.pool)
        .await?;
        expect_one(result)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl BaseClientStore for PostgresStore {
    async fn insert_client(
        &self,
        user_id: UserId,
        client: NewClient,
        at: DateTime<Utc>,
    ) -> Result<Client, StoreError> {
        // The foreign key alone would accept a soft-deleted owner
        let owner_live: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND deletion_time IS NULL)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        if !owner_live {
            return Err(StoreError::Constraint("user_id".to_string()));
        }

        sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (
                id, user_id, name, notification_token, os, sdk, creation_time, modification_time
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(ClientId::new())
        .bind(user_id)
        .bind(client.name)
        .bind(client.notification_token)
        .bind(client.os)
        .bind(client.sdk)
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn find_client(&self, user_id: UserId, id: ClientId) -> Result<Client, StoreError> {
        sqlx::query_as::<_, Client>(
            "SELECT * FROM clients WHERE id = $1 AND user_id = $2 AND deletion_time IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn list_clients(&self, user_id: UserId) -> Result<Vec<Client>, StoreError> {
        sqlx::query_as::<_, Client>(
            "SELECT * FROM clients WHERE user_id = $1 AND deletion_time IS NULL \
             ORDER BY creation_time",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn update_client(
        &self,
        user_id: UserId,
        id: ClientId,
        changes: ClientChanges,
        stamped_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<Client, StoreError> {
        let updated = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients SET
                name = COALESCE($3, name),
                notification_token = COALESCE($4, notification_token),
                os = COALESCE($5, os),
                sdk = COALESCE($6, sdk),
                modification_time = $7
            WHERE id = $1 AND user_id = $2 AND deletion_time IS NULL
                AND modification_time < $8
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(changes.name)
        .bind(changes.notification_token)
        .bind(changes.os)
        .bind(changes.sdk)
        .bind(at)
        .bind(stamped_at)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(client) => Ok(client),
            None => {
                self.find_client(user_id, id).await?;
                Err(StoreError::Stale)
            }
        }
    }

    async fn delete_client(
        &self,
        user_id: UserId,
        id: ClientId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE clients SET deletion_time = $3, modification_time = $3 \
             WHERE id = $1 AND user_id = $2 AND deletion_time IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        expect_one(result)
    }
}

#[async_trait]
impl BaseSessionStore for PostgresStore {
    async fn create_session(
        &self,
        user_id: Option<UserId>,
        at: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (id, user_id, creation_time, modification_time) \
             VALUES ($1, $2, $3, $3) RETURNING *",
        )
        .bind(SessionId::random())
        .bind(user_id)
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn find_session(&self, id: SessionId) -> Result<Session, StoreError> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn update_session_data(
        &self,
        id: SessionId,
        data: Vec<u8>,
        at: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        sqlx::query_as::<_, Session>(
            "UPDATE sessions SET data = $2, modification_time = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(data)
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn take_session_data(
        &self,
        id: SessionId,
        at: DateTime<Utc>,
    ) -> Result<Vec<u8>, StoreError> {
        sqlx::query_scalar::<_, Vec<u8>>(
            r#"
            UPDATE sessions SET data = '', modification_time = $2
            FROM (SELECT id, data FROM sessions WHERE id = $1 FOR UPDATE) AS old
            WHERE sessions.id = old.id
            RETURNING old.data
            "#,
        )
        .bind(id)
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_one(result)
    }
}
