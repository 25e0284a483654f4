//! `/users/:0/tokens` - email confirmation and password reset.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::common::{AncestorChain, Authorize, Caller, Operation, UserId};
use crate::domains::users::activities::{confirm_email, issue_reset_token, reset_password};
use crate::kernel::{ServerDeps, StoreError};
use crate::server::auth::{Bypass, Credentials};
use crate::server::dispatch::{Admitted, Guard, PathParams};
use crate::server::error::ApiError;
use crate::server::response::{failure, success, with_cookie};
use crate::Settings;

const TOKEN_DEPTH: usize = 1;

/// Confirming an email requires being that user; the reset flows are
/// authorized by possession of the token itself.
struct Tokens;

#[async_trait]
impl Authorize for Tokens {
    async fn is_authorized(
        &self,
        caller: &Caller,
        operation: Operation,
        chain: &AncestorChain,
    ) -> Result<bool, StoreError> {
        match operation {
            Operation::Add => {
                let target: Option<UserId> = chain.get(0);
                Ok(target.is_some_and(|id| caller.is(id)))
            }
            _ => Ok(true),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfirmationPayload {
    #[serde(default)]
    token: String,
}

#[derive(Debug, Deserialize)]
struct ResetPayload {
    #[serde(default)]
    token: String,
    #[serde(default)]
    password: String,
}

#[derive(Clone)]
struct TokenRoutes {
    deps: ServerDeps,
    settings: Arc<Settings>,
    confirm: Guard,
    request_reset: Guard,
    reset: Guard,
}

impl TokenRoutes {
    fn target(chain: &AncestorChain) -> Result<UserId, ApiError> {
        chain
            .get(0)
            .ok_or(ApiError::Store(StoreError::NotFound))
    }

    fn respond(
        &self,
        origin: &str,
        result: Result<Response, ApiError>,
        set_cookie: Option<HeaderValue>,
    ) -> Response {
        let response =
            result.unwrap_or_else(|err| failure(origin, &err, self.settings.diagnostics));
        with_cookie(response, set_cookie)
    }

    async fn confirm(&self, params: PathParams, headers: HeaderMap, body: Bytes) -> Response {
        let mut set_cookie = None;
        let result = self.try_confirm(params, &headers, &body, &mut set_cookie).await;
        self.respond("validate_email", result, set_cookie)
    }

    async fn try_confirm(
        &self,
        params: PathParams,
        headers: &HeaderMap,
        body: &[u8],
        set_cookie: &mut Option<HeaderValue>,
    ) -> Result<Response, ApiError> {
        let Admitted { chain, .. } = self
            .confirm
            .admit(params, headers, &Tokens, set_cookie)
            .await?;
        let opened = self.settings.freshness.open::<ConfirmationPayload>(body)?;
        let user_id = Self::target(&chain)?;
        confirm_email(
            self.deps.users.as_ref(),
            user_id,
            &opened.payload.token,
            Utc::now(),
        )
        .await?;
        Ok(success("validate_email", json!({ "id": user_id })))
    }

    async fn request_reset(&self, params: PathParams, headers: HeaderMap) -> Response {
        let mut set_cookie = None;
        let result = self.try_request_reset(params, &headers, &mut set_cookie).await;
        self.respond("reset_token", result, set_cookie)
    }

    async fn try_request_reset(
        &self,
        params: PathParams,
        headers: &HeaderMap,
        set_cookie: &mut Option<HeaderValue>,
    ) -> Result<Response, ApiError> {
        let Admitted { chain, .. } = self
            .request_reset
            .admit(params, headers, &Tokens, set_cookie)
            .await?;
        let user_id = Self::target(&chain)?;
        issue_reset_token(
            self.deps.users.as_ref(),
            self.deps.mailer.as_ref(),
            user_id,
            Utc::now(),
        )
        .await?;
        Ok(success("reset_token", json!({ "id": user_id })))
    }

    async fn reset(&self, params: PathParams, headers: HeaderMap, body: Bytes) -> Response {
        let mut set_cookie = None;
        let result = self.try_reset(params, &headers, &body, &mut set_cookie).await;
        self.respond("reset_password", result, set_cookie)
    }

    async fn try_reset(
        &self,
        params: PathParams,
        headers: &HeaderMap,
        body: &[u8],
        set_cookie: &mut Option<HeaderValue>,
    ) -> Result<Response, ApiError> {
        let Admitted { chain, .. } = self
            .reset
            .admit(params, headers, &Tokens, set_cookie)
            .await?;
        let opened = self.settings.freshness.open::<ResetPayload>(body)?;
        let user_id = Self::target(&chain)?;
        reset_password(
            self.deps.users.as_ref(),
            user_id,
            &opened.payload.token,
            &opened.payload.password,
            Utc::now(),
        )
        .await?;
        Ok(success("reset_password", json!({ "id": user_id })))
    }
}

pub fn token_routes(deps: ServerDeps, settings: Arc<Settings>) -> Router {
    let credentials = Arc::new(Credentials::new(deps.users.clone()).allow_unconfirmed());
    let routes = TokenRoutes {
        confirm: Guard::new(Operation::Add, TOKEN_DEPTH, credentials),
        request_reset: Guard::new(Operation::Get, TOKEN_DEPTH, Arc::new(Bypass)),
        reset: Guard::new(Operation::Update, TOKEN_DEPTH, Arc::new(Bypass)),
        deps,
        settings,
    };

    let confirm = routes.clone();
    let request_reset = routes.clone();
    let reset = routes;

    Router::new().route(
        "/users/:0/tokens",
        post(move |params: PathParams, headers: HeaderMap, body: Bytes| async move {
            confirm.confirm(params, headers, body).await
        })
        .get(move |params: PathParams, headers: HeaderMap| async move {
            request_reset.request_reset(params, headers).await
        })
        .put(move |params: PathParams, headers: HeaderMap, body: Bytes| async move {
            reset.reset(params, headers, body).await
        }),
    )
}
