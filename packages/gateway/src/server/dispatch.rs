//! Request admission and CRUD dispatch.
//!
//! Every resource request runs the same pipeline, stopping at the first
//! failure:
//!
//! 1. resolve the ancestor chain from the path
//! 2. check the chain depth the operation demands
//! 3. identify the caller through the endpoint's strategy
//! 4. ask the resource type through the [`Gate`]
//! 5. open the write envelope (add and update only)
//! 6. run the operation and redact the output

use std::sync::Arc;

use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::RawPathParams;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use bytes::Bytes;
use chrono::Utc;
use serde_json::json;

use super::auth::AuthStrategy;
use super::error::ApiError;
use super::response::{failure, success, with_cookie};
use crate::common::{resolve_ancestors, AncestorChain, Authorize, Caller, Gate, Operation};
use crate::domains::{Entity, Record};
use crate::Settings;

pub type PathParams = Result<RawPathParams, RawPathParamsRejection>;

/// A request that passed steps 1 through 4
pub struct Admitted {
    pub caller: Caller,
    pub chain: AncestorChain,
}

/// Steps 1 through 4 for one route and operation
#[derive(Clone)]
pub struct Guard {
    operation: Operation,
    expected_depth: usize,
    strategy: Arc<dyn AuthStrategy>,
}

impl Guard {
    pub fn new(operation: Operation, expected_depth: usize, strategy: Arc<dyn AuthStrategy>) -> Self {
        Self {
            operation,
            expected_depth,
            strategy,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Admit the request or explain why not.
    ///
    /// A cookie minted while identifying the caller is written to `set_cookie`
    /// even if a later step rejects the request.
    pub async fn admit<R>(
        &self,
        params: PathParams,
        headers: &HeaderMap,
        resource: &R,
        set_cookie: &mut Option<HeaderValue>,
    ) -> Result<Admitted, ApiError>
    where
        R: Authorize + ?Sized,
    {
        let chain = match params {
            Ok(params) => resolve_ancestors(params.iter())?,
            Err(RawPathParamsRejection::MissingPathParams(_)) => AncestorChain::default(),
            Err(e) => return Err(ApiError::bad_request(e)),
        };

        if chain.len() != self.expected_depth {
            return Err(ApiError::AncestorDepth {
                expected: self.expected_depth,
                actual: chain.len(),
            });
        }

        let identified = self.strategy.identify(headers).await?;
        *set_cookie = identified.set_cookie;

        Gate::new(&identified.caller)
            .can(self.operation)
            .on(&chain)
            .check(resource)
            .await?;

        Ok(Admitted {
            caller: identified.caller,
            chain,
        })
    }
}

/// One operation on one resource type
pub struct Endpoint<E: Entity> {
    entity: Arc<E>,
    guard: Guard,
    settings: Arc<Settings>,
}

impl<E: Entity> Endpoint<E> {
    pub fn new(
        entity: Arc<E>,
        operation: Operation,
        strategy: Arc<dyn AuthStrategy>,
        settings: Arc<Settings>,
    ) -> Self {
        let expected_depth = operation.expected_depth(entity.root_depth());
        Self {
            entity,
            guard: Guard::new(operation, expected_depth, strategy),
            settings,
        }
    }

    /// Always produces exactly one response
    pub async fn dispatch(&self, params: PathParams, headers: HeaderMap, body: Bytes) -> Response {
        let origin = self.guard.operation().origin();
        let mut set_cookie = None;

        let response = match self.run(params, &headers, &body, &mut set_cookie).await {
            Ok(response) => response,
            Err(err) => failure(origin, &err, self.settings.diagnostics),
        };
        with_cookie(response, set_cookie)
    }

    async fn run(
        &self,
        params: PathParams,
        headers: &HeaderMap,
        body: &[u8],
        set_cookie: &mut Option<HeaderValue>,
    ) -> Result<Response, ApiError> {
        let operation = self.guard.operation();
        let origin = operation.origin();
        let Admitted { chain, .. } = self
            .guard
            .admit(params, headers, self.entity.as_ref(), set_cookie)
            .await?;

        let now = Utc::now();
        match operation {
            Operation::Add => {
                let opened = self.settings.freshness.open::<E::Record>(body)?;
                let written = self.entity.add(&chain, opened.payload, now).await?;
                Ok(success(origin, written))
            }
            Operation::Update => {
                let opened = self.settings.freshness.open_update::<E::Record>(body)?;
                let written = self
                    .entity
                    .update(&chain, opened.payload, opened.timestamp, now)
                    .await?;
                Ok(success(origin, written))
            }
            Operation::Get => {
                let mut record = self.entity.get(&chain).await?;
                record.redact();
                Ok(success(origin, record))
            }
            Operation::List => {
                let mut records = self.entity.list(&chain).await?;
                records.iter_mut().for_each(|record| record.redact());
                Ok(success(origin, records))
            }
            Operation::Delete => {
                self.entity.delete(&chain, now).await?;
                let id = chain.as_slice().last().copied();
                Ok(success(origin, json!({ "id": id, "deletion_time": now })))
            }
        }
    }
}
