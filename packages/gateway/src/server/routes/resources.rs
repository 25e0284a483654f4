//! Router wiring for CRUD resource types.

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;
use bytes::Bytes;

use crate::common::Operation;
use crate::domains::Entity;
use crate::server::auth::AuthStrategy;
use crate::server::dispatch::{Endpoint, PathParams};
use crate::Settings;

/// Mounts the operations of one resource type.
///
/// ```rust,ignore
/// ResourceRoutes::new(users, settings, "/users", "/users/:0")
///     .with(Operation::Add, bypass)
///     .with(Operation::Get, credentials)
///     .into_router();
/// ```
pub struct ResourceRoutes<E: Entity> {
    entity: Arc<E>,
    settings: Arc<Settings>,
    collection: String,
    member: String,
    operations: Vec<(Operation, Arc<dyn AuthStrategy>)>,
}

impl<E: Entity> ResourceRoutes<E> {
    pub fn new(
        entity: Arc<E>,
        settings: Arc<Settings>,
        collection: impl Into<String>,
        member: impl Into<String>,
    ) -> Self {
        Self {
            entity,
            settings,
            collection: collection.into(),
            member: member.into(),
            operations: Vec::new(),
        }
    }

    /// Serve `operation`, identifying callers with `strategy`
    pub fn with(mut self, operation: Operation, strategy: Arc<dyn AuthStrategy>) -> Self {
        self.operations.push((operation, strategy));
        self
    }

    /// Serve every operation with the same strategy
    pub fn with_all(self, strategy: Arc<dyn AuthStrategy>) -> Self {
        [
            Operation::Add,
            Operation::List,
            Operation::Get,
            Operation::Update,
            Operation::Delete,
        ]
        .into_iter()
        .fold(self, |routes, operation| routes.with(operation, strategy.clone()))
    }

    pub fn into_router(self) -> Router {
        let mut collection: Option<MethodRouter> = None;
        let mut member: Option<MethodRouter> = None;

        for (operation, strategy) in self.operations {
            let endpoint = Arc::new(Endpoint::new(
                self.entity.clone(),
                operation,
                strategy,
                self.settings.clone(),
            ));
            let handler = move |params: PathParams, headers: HeaderMap, body: Bytes| async move {
                endpoint.dispatch(params, headers, body).await
            };

            let (slot, filter) = match operation {
                Operation::Add => (&mut collection, MethodFilter::POST),
                Operation::List => (&mut collection, MethodFilter::GET),
                Operation::Get => (&mut member, MethodFilter::GET),
                Operation::Update => (&mut member, MethodFilter::PUT),
                Operation::Delete => (&mut member, MethodFilter::DELETE),
            };
            *slot = Some(match slot.take() {
                Some(router) => router.on(filter, handler),
                None => MethodRouter::new().on(filter, handler),
            });
        }

        let mut router = Router::new();
        if let Some(methods) = collection {
            router = router.route(&self.collection, methods);
        }
        if let Some(methods) = member {
            router = router.route(&self.member, methods);
        }
        router
    }
}
