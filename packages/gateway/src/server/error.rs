//! Wire-level error taxonomy.
//!
//! Every failure a request can hit is converted into one of these variants at
//! the dispatcher boundary, then rendered as `(status, description, debug?)`.

use axum::http::StatusCode;
use thiserror::Error;

use crate::common::message::EnvelopeError;
use crate::common::{AncestorError, AuthError};
use crate::domains::users::activities::TokenError;
use crate::kernel::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed request that is not an envelope or path problem
    #[error("{description}")]
    ClientInput {
        description: String,
        detail: Option<String>,
    },

    #[error(transparent)]
    Ancestors(#[from] AncestorError),

    #[error("expected {expected} ancestors, got {actual}")]
    AncestorDepth { expected: usize, actual: usize },

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error("unauthenticated")]
    NotAuthenticated,

    #[error("user has no authority to perform request")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(detail: impl ToString) -> Self {
        ApiError::ClientInput {
            description: "bad request".to_string(),
            detail: Some(detail.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ClientInput { .. }
            | ApiError::Ancestors(_)
            | ApiError::AncestorDepth { .. }
            | ApiError::Envelope(_) => StatusCode::BAD_REQUEST,
            ApiError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Store(e) => match e {
                StoreError::NotFound => StatusCode::NOT_FOUND,
                StoreError::Constraint(_)
                | StoreError::DuplicatedKey(_)
                | StoreError::TermsNotAccepted
                | StoreError::Stale
                | StoreError::Rule(_) => StatusCode::BAD_REQUEST,
                StoreError::Internal(_) | StoreError::Other(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caller-facing description; never contains underlying error text.
    pub fn description(&self) -> String {
        match self {
            ApiError::Store(e) => match e {
                StoreError::NotFound => "resource not found".to_string(),
                StoreError::Constraint(_) => "key missing or unexisting".to_string(),
                StoreError::DuplicatedKey(_) => "duplicated entry".to_string(),
                StoreError::TermsNotAccepted => "terms not accepted".to_string(),
                StoreError::Stale => e.to_string(),
                StoreError::Rule(description) => description.clone(),
                StoreError::Internal(_) => "internal server error".to_string(),
                StoreError::Other(_) => "unknown error".to_string(),
            },
            other => other.to_string(),
        }
    }

    /// Underlying error text, attached only in diagnostic mode.
    pub fn detail(&self) -> Option<String> {
        match self {
            ApiError::ClientInput { detail, .. } => detail.clone(),
            ApiError::Ancestors(e) => Some(e.detail()),
            ApiError::AncestorDepth { .. } => None,
            ApiError::Envelope(e) => Some(e.detail()),
            ApiError::NotAuthenticated | ApiError::Forbidden => None,
            ApiError::Store(e) => Some(e.to_string()),
            ApiError::Internal(e) => Some(format!("{e:#}")),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotAuthenticated => ApiError::NotAuthenticated,
            AuthError::Forbidden => ApiError::Forbidden,
            AuthError::Lookup(e) => ApiError::Store(e),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Store(e) => ApiError::Store(e),
            other => ApiError::ClientInput {
                description: other.to_string(),
                detail: None,
            },
        }
    }
}
