use chrono::{DateTime, Utc};

use crate::common::auth::DEFAULT_AUTH_LEVEL;
use crate::common::credentials::Digest;
use crate::common::UserId;

/// User model - SQL persistence layer
///
/// Credentials are stored only as salted digests. The outstanding one-time
/// token (email confirmation or password reset) is stored the same way.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_salt: String,
    pub password_hash: String,

    pub email_confirmed: bool,
    pub accepted_terms: bool,
    pub accepted_news: bool,
    pub country_code: Option<String>,
    pub auth_level: i32,

    pub token_salt: Option<String>,
    pub token_hash: Option<String>,

    pub creation_time: DateTime<Utc>,
    pub modification_time: DateTime<Utc>,
    pub deletion_time: Option<DateTime<Utc>>,
}

impl User {
    pub fn password(&self) -> Digest {
        Digest {
            salt: self.password_salt.clone(),
            hash: self.password_hash.clone(),
        }
    }

    pub fn token(&self) -> Option<Digest> {
        match (&self.token_salt, &self.token_hash) {
            (Some(salt), Some(hash)) => Some(Digest {
                salt: salt.clone(),
                hash: hash.clone(),
            }),
            _ => None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deletion_time.is_some()
    }
}

/// Fields supplied when registering a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: Digest,
    pub accepted_terms: bool,
    pub accepted_news: bool,
    pub country_code: Option<String>,
    pub auth_level: i32,
    pub token: Option<Digest>,
}

impl NewUser {
    pub fn new(username: impl Into<String>, password: &str) -> Self {
        Self {
            username: username.into(),
            password: Digest::password(password),
            accepted_terms: true,
            accepted_news: false,
            country_code: None,
            auth_level: DEFAULT_AUTH_LEVEL,
            token: None,
        }
    }

    pub fn with_auth_level(mut self, level: i32) -> Self {
        self.auth_level = level;
        self
    }

    pub fn with_token(mut self, token: Digest) -> Self {
        self.token = Some(token);
        self
    }
}

/// Partial update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password: Option<Digest>,
    pub accepted_news: Option<bool>,
    pub country_code: Option<String>,
}
