//! `/draft` - side-data kept in the session across a redirect.
//!
//! `PUT` stores any JSON value; `GET` returns it once and clears it.

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use serde_json::Value;

use crate::domains::sessions::Session;
use crate::server::auth::{Identified, SessionManager, Strictness};
use crate::server::error::ApiError;
use crate::server::response::{failure, success, with_cookie};
use crate::Settings;

#[derive(Clone)]
struct DraftRoutes {
    manager: Arc<SessionManager>,
    settings: Arc<Settings>,
}

impl DraftRoutes {
    async fn take(&self, headers: HeaderMap) -> Response {
        let Identified { caller, set_cookie } =
            match self.manager.resolve(&headers, Strictness::Anonymous).await {
                Ok(identified) => identified,
                Err(err) => return failure("draft", &err, self.settings.diagnostics),
            };

        let response = match self.try_take(caller.session()).await {
            Ok(value) => success("draft", value),
            Err(err) => failure("draft", &err, self.settings.diagnostics),
        };
        with_cookie(response, set_cookie)
    }

    async fn store(&self, headers: HeaderMap, body: Bytes) -> Response {
        let Identified { caller, set_cookie } =
            match self.manager.resolve(&headers, Strictness::Anonymous).await {
                Ok(identified) => identified,
                Err(err) => return failure("draft", &err, self.settings.diagnostics),
            };

        let response = match self.try_store(caller.session(), &body).await {
            Ok(()) => success("draft", Value::Null),
            Err(err) => failure("draft", &err, self.settings.diagnostics),
        };
        with_cookie(response, set_cookie)
    }

    async fn try_take(&self, session: Option<&Session>) -> Result<Value, ApiError> {
        let session = session.ok_or(ApiError::NotAuthenticated)?;
        let data = self.manager.take_data(session).await?;
        if data.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&data).map_err(ApiError::bad_request)
    }

    async fn try_store(
        &self,
        session: Option<&Session>,
        body: &[u8],
    ) -> Result<(), ApiError> {
        let session = session.ok_or(ApiError::NotAuthenticated)?;
        serde_json::from_slice::<Value>(body).map_err(ApiError::bad_request)?;
        self.manager.store_data(session, body.to_vec()).await?;
        Ok(())
    }
}

pub fn draft_routes(manager: Arc<SessionManager>, settings: Arc<Settings>) -> Router {
    let routes = DraftRoutes { manager, settings };
    let take = routes.clone();
    let store = routes;

    Router::new().route(
        "/draft",
        get(move |headers: HeaderMap| async move { take.take(headers).await }).put(
            move |headers: HeaderMap, body: Bytes| async move { store.store(headers, body).await },
        ),
    )
}
