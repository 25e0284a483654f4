//! How an endpoint learns who the caller is.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue};

use super::credentials::{basic_credentials, verify_credentials};
use super::session::{SessionManager, Strictness};
use crate::common::{AuthError, Caller};
use crate::kernel::BaseUserStore;
use crate::server::error::ApiError;

/// Caller identity plus any cookie minted while establishing it
#[derive(Debug)]
pub struct Identified {
    pub caller: Caller,
    pub set_cookie: Option<HeaderValue>,
}

impl Identified {
    pub fn stateless(caller: Caller) -> Self {
        Self {
            caller,
            set_cookie: None,
        }
    }
}

#[async_trait]
pub trait AuthStrategy: Send + Sync {
    async fn identify(&self, headers: &HeaderMap) -> Result<Identified, ApiError>;
}

/// Basic credentials checked on every request; nothing persisted
pub struct Credentials {
    users: Arc<dyn BaseUserStore>,
    require_confirmed: bool,
}

impl Credentials {
    pub fn new(users: Arc<dyn BaseUserStore>) -> Self {
        Self {
            users,
            require_confirmed: true,
        }
    }

    /// Accept accounts whose email is not yet confirmed
    pub fn allow_unconfirmed(mut self) -> Self {
        self.require_confirmed = false;
        self
    }
}

#[async_trait]
impl AuthStrategy for Credentials {
    async fn identify(&self, headers: &HeaderMap) -> Result<Identified, ApiError> {
        let (username, password) =
            basic_credentials(headers).ok_or(AuthError::NotAuthenticated)?;
        let account = verify_credentials(
            self.users.as_ref(),
            &username,
            &password,
            self.require_confirmed,
        )
        .await?;
        Ok(Identified::stateless(Caller::Stateless(account)))
    }
}

/// Session cookie resolved through the session manager
pub struct SessionCookie {
    manager: Arc<SessionManager>,
    strictness: Strictness,
}

impl SessionCookie {
    pub fn new(manager: Arc<SessionManager>, strictness: Strictness) -> Self {
        Self {
            manager,
            strictness,
        }
    }
}

#[async_trait]
impl AuthStrategy for SessionCookie {
    async fn identify(&self, headers: &HeaderMap) -> Result<Identified, ApiError> {
        self.manager.resolve(headers, self.strictness).await
    }
}

/// No identification; the resource's own rules decide
pub struct Bypass;

#[async_trait]
impl AuthStrategy for Bypass {
    async fn identify(&self, _headers: &HeaderMap) -> Result<Identified, ApiError> {
        Ok(Identified::stateless(Caller::Anonymous))
    }
}
