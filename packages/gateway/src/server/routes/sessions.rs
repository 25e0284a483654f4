//! `/sessions` - cookie login and logout.

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::kernel::BaseUserStore;
use crate::server::auth::{verify_credentials, SessionManager};
use crate::server::error::ApiError;
use crate::server::response::{failure, success, with_cookie};
use crate::Settings;

#[derive(Debug, Deserialize)]
struct LoginPayload {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Clone)]
struct SessionRoutes {
    manager: Arc<SessionManager>,
    users: Arc<dyn BaseUserStore>,
    settings: Arc<Settings>,
}

impl SessionRoutes {
    async fn login(&self, headers: HeaderMap, body: Bytes) -> Response {
        match self.try_login(&headers, &body).await {
            Ok((response, cookie)) => with_cookie(response, Some(cookie)),
            Err(err) => failure("login", &err, self.settings.diagnostics),
        }
    }

    async fn try_login(
        &self,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<(Response, HeaderValue), ApiError> {
        let opened = self.settings.freshness.open::<LoginPayload>(body)?;
        let account = verify_credentials(
            self.users.as_ref(),
            opened.payload.username.trim(),
            &opened.payload.password,
            true,
        )
        .await?;

        let (session, cookie) = self.manager.login(headers, account.id).await?;
        info!(user_id = %account.id, session_id = %session.id, "session login");
        Ok((success("login", json!({ "user_id": account.id })), cookie))
    }

    async fn logout(&self, headers: HeaderMap) -> Response {
        match self.manager.logout(&headers).await {
            Ok(cookie) => with_cookie(success("logout", json!({})), Some(cookie)),
            Err(err) => failure("logout", &err, self.settings.diagnostics),
        }
    }
}

pub fn session_routes(
    manager: Arc<SessionManager>,
    users: Arc<dyn BaseUserStore>,
    settings: Arc<Settings>,
) -> Router {
    let routes = SessionRoutes {
        manager,
        users,
        settings,
    };
    let login = routes.clone();
    let logout = routes;

    Router::new().route(
        "/sessions",
        post(move |headers: HeaderMap, body: Bytes| async move {
            login.login(headers, body).await
        })
        .delete(move |headers: HeaderMap| async move { logout.logout(headers).await }),
    )
}
