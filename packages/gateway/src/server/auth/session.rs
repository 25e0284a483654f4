use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::strategy::Identified;
use crate::common::{Account, Caller, SessionId, UserId};
use crate::domains::sessions::Session;
use crate::kernel::{BaseSessionStore, BaseUserStore, StoreError};
use crate::server::error::ApiError;
use crate::Settings;

/// Claims carried by the session cookie
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String,    // Subject (session id as string)
    pub sid: Uuid,      // Session UUID
    pub exp: i64,       // Expiration timestamp
    pub iat: i64,       // Issued at timestamp
    pub iss: String,    // Issuer (cookie name)
}

/// Signs and verifies session references
#[derive(Clone)]
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl SessionTokens {
    pub fn new(secret: &str, issuer: String, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            ttl,
        }
    }

    pub fn issue(&self, session_id: SessionId) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: session_id.to_string(),
            sid: session_id.into_uuid(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Session id from a valid, unexpired token
    pub fn verify(&self, token: &str) -> Result<SessionId, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| SessionId::from_uuid(data.claims.sid))
    }
}

/// What an endpoint demands of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// Any session will do; one is minted when absent
    Anonymous,
    /// A session bound to a user with a confirmed email
    Confirmed,
}

/// Cookie-backed sessions
pub struct SessionManager {
    cookie_name: String,
    tokens: SessionTokens,
    sessions: Arc<dyn BaseSessionStore>,
    users: Arc<dyn BaseUserStore>,
}

impl SessionManager {
    pub fn new(
        settings: &Settings,
        sessions: Arc<dyn BaseSessionStore>,
        users: Arc<dyn BaseUserStore>,
    ) -> Self {
        Self {
            cookie_name: settings.cookie_name.clone(),
            tokens: SessionTokens::new(
                &settings.session_secret,
                settings.cookie_name.clone(),
                settings.session_ttl,
            ),
            sessions,
            users,
        }
    }

    /// Value of the session cookie, if the request carries one
    fn cookie_value<'h>(&self, headers: &'h HeaderMap) -> Option<&'h str> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value)
    }

    /// The session referenced by the request cookie.
    ///
    /// A missing cookie, a token that fails verification and a token naming a
    /// session that no longer exists all mean "no session".
    pub async fn load(&self, headers: &HeaderMap) -> Result<Option<Session>, StoreError> {
        let Some(token) = self.cookie_value(headers) else {
            return Ok(None);
        };

        let session_id = match self.tokens.verify(token) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "rejected session token");
                return Ok(None);
            }
        };

        match self.sessions.find_session(session_id).await {
            Ok(session) => {
                debug!(session_id = %session.id, "session loaded");
                Ok(Some(session))
            }
            Err(StoreError::NotFound) => {
                debug!(session_id = %session_id, "session token names missing session");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Persist a new session and produce its cookie
    pub async fn init(&self, user_id: Option<UserId>) -> Result<(Session, HeaderValue), ApiError> {
        let session = self.sessions.create_session(user_id, Utc::now()).await?;
        let token = self
            .tokens
            .issue(session.id)
            .map_err(|e| ApiError::Internal(e.into()))?;
        let cookie = self.session_cookie(&token)?;
        debug!(session_id = %session.id, anonymous = session.is_anonymous(), "session created");
        Ok((session, cookie))
    }

    /// Session-scoped cookie: no Max-Age or Expires
    pub fn session_cookie(&self, token: &str) -> Result<HeaderValue, ApiError> {
        HeaderValue::from_str(&format!(
            "{}={}; Path=/; Secure; HttpOnly; SameSite=Lax",
            self.cookie_name, token
        ))
        .map_err(|e| ApiError::Internal(e.into()))
    }

    pub fn expired_cookie(&self) -> Result<HeaderValue, ApiError> {
        HeaderValue::from_str(&format!(
            "{}=; Path=/; Max-Age=0; Secure; HttpOnly; SameSite=Lax",
            self.cookie_name
        ))
        .map_err(|e| ApiError::Internal(e.into()))
    }

    /// Identify the caller from the session cookie.
    pub async fn resolve(
        &self,
        headers: &HeaderMap,
        strictness: Strictness,
    ) -> Result<Identified, ApiError> {
        let existing = self.load(headers).await?;

        match strictness {
            Strictness::Anonymous => {
                let (session, set_cookie) = match existing {
                    Some(session) => (session, None),
                    None => {
                        let (session, cookie) = self.init(None).await?;
                        (session, Some(cookie))
                    }
                };
                let account = match session.user_id {
                    Some(user_id) => self.account(user_id).await?,
                    None => None,
                };
                Ok(Identified {
                    caller: Caller::SessionBound { session, account },
                    set_cookie,
                })
            }
            Strictness::Confirmed => {
                let session = existing.ok_or(ApiError::NotAuthenticated)?;
                let user_id = session.user_id.ok_or(ApiError::NotAuthenticated)?;
                let account = self
                    .account(user_id)
                    .await?
                    .filter(|a| a.email_confirmed)
                    .ok_or(ApiError::NotAuthenticated)?;
                Ok(Identified {
                    caller: Caller::SessionBound {
                        session,
                        account: Some(account),
                    },
                    set_cookie: None,
                })
            }
        }
    }

    async fn account(&self, user_id: UserId) -> Result<Option<Account>, StoreError> {
        match self.users.find_user(user_id).await {
            Ok(user) => Ok(Some(Account::from(&user))),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Replace the session side-data
    pub async fn store_data(&self, session: &Session, data: Vec<u8>) -> Result<Session, StoreError> {
        self.sessions
            .update_session_data(session.id, data, Utc::now())
            .await
    }

    /// Read the side-data and clear it. A second call returns nothing.
    pub async fn take_data(&self, session: &Session) -> Result<Vec<u8>, StoreError> {
        self.sessions.take_session_data(session.id, Utc::now()).await
    }

    /// Bind a fresh session to `user_id`, discarding the request's old session
    pub async fn login(
        &self,
        headers: &HeaderMap,
        user_id: UserId,
    ) -> Result<(Session, HeaderValue), ApiError> {
        if let Some(previous) = self.load(headers).await? {
            self.discard(previous.id).await?;
        }
        self.init(Some(user_id)).await
    }

    /// Delete the request's session and produce an expiring cookie
    pub async fn logout(&self, headers: &HeaderMap) -> Result<HeaderValue, ApiError> {
        if let Some(session) = self.load(headers).await? {
            self.discard(session.id).await?;
            debug!(session_id = %session.id, "session deleted");
        }
        self.expired_cookie()
    }

    async fn discard(&self, id: SessionId) -> Result<(), StoreError> {
        match self.sessions.delete_session(id).await {
            Ok(()) | Err(StoreError::NotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
