//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::common::Operation;
use crate::domains::clients::Clients;
use crate::domains::users::Users;
use crate::kernel::ServerDeps;
use crate::server::auth::{AuthStrategy, Bypass, Credentials, SessionCookie, SessionManager, Strictness};
use crate::server::middleware::canonical_host_middleware;
use crate::server::routes::{
    draft_routes, health_handler, session_routes, token_routes, ResourceRoutes,
};
use crate::Settings;

/// Resource routes for one identification strategy
fn resource_routes(
    deps: &ServerDeps,
    settings: &Arc<Settings>,
    register: Arc<dyn AuthStrategy>,
    member: Arc<dyn AuthStrategy>,
) -> Router {
    let users = Arc::new(Users::new(deps.users.clone(), deps.mailer.clone()));
    let clients = Arc::new(Clients::new(deps.clients.clone()));

    let users = ResourceRoutes::new(users, settings.clone(), "/users", "/users/:0")
        .with(Operation::Add, register)
        .with(Operation::List, member.clone())
        .with(Operation::Get, member.clone())
        .with(Operation::Update, member.clone())
        .with(Operation::Delete, member.clone())
        .into_router();

    let clients = ResourceRoutes::new(
        clients,
        settings.clone(),
        "/users/:0/clients",
        "/users/:0/clients/:1",
    )
    .with_all(member)
    .into_router();

    users.merge(clients)
}

/// Build the Axum application router
///
/// - `/users`, `/users/:0/clients`: basic credentials on every request
/// - `/users/:0/tokens`: email confirmation and password reset
/// - `/sessions`: cookie login and logout
/// - `/web/...`: the resource routes again, identified by session cookie
pub fn build_app(deps: ServerDeps, settings: Settings, allowed_origins: Vec<String>) -> Router {
    let settings = Arc::new(settings);
    let sessions = Arc::new(SessionManager::new(
        &settings,
        deps.sessions.clone(),
        deps.users.clone(),
    ));

    let credentials: Arc<dyn AuthStrategy> = Arc::new(Credentials::new(deps.users.clone()));
    let api = resource_routes(&deps, &settings, Arc::new(Bypass), credentials)
        .merge(token_routes(deps.clone(), settings.clone()))
        .merge(session_routes(
            sessions.clone(),
            deps.users.clone(),
            settings.clone(),
        ));

    let web = resource_routes(
        &deps,
        &settings,
        Arc::new(SessionCookie::new(sessions.clone(), Strictness::Anonymous)),
        Arc::new(SessionCookie::new(sessions.clone(), Strictness::Confirmed)),
    )
    .merge(draft_routes(sessions, settings.clone()));

    // CORS: only configured origins may make credentialed requests
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .merge(api)
        .nest("/web", web)
        .route("/health", get(health_handler))
        .layer(middleware::from_fn_with_state(
            settings.canonical_protocol.clone(),
            canonical_host_middleware,
        ))
        .layer(Extension(deps))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
