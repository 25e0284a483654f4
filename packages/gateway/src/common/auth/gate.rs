use async_trait::async_trait;
use tracing::debug;

use super::{AuthError, Caller, Operation};
use crate::common::AncestorChain;
use crate::kernel::StoreError;

/// Permission predicate owned by each resource type.
///
/// `Ok(false)` means the caller is known and denied; `Err` means the decision
/// could not be evaluated (for example the account could not be re-read).
#[async_trait]
pub trait Authorize: Send + Sync {
    async fn is_authorized(
        &self,
        caller: &Caller,
        operation: Operation,
        chain: &AncestorChain,
    ) -> Result<bool, StoreError>;
}

/// Entry point for authorization checks
pub struct Gate<'a> {
    caller: &'a Caller,
}

impl<'a> Gate<'a> {
    pub fn new(caller: &'a Caller) -> Self {
        Self { caller }
    }

    /// Specify the kind of access requested
    pub fn can(self, operation: Operation) -> AccessRequest<'a> {
        AccessRequest {
            caller: self.caller,
            operation,
        }
    }
}

/// Builder after specifying the operation
pub struct AccessRequest<'a> {
    caller: &'a Caller,
    operation: Operation,
}

impl<'a> AccessRequest<'a> {
    /// Scope the request to an exact ancestor chain
    pub fn on(self, chain: &'a AncestorChain) -> ScopedRequest<'a> {
        ScopedRequest {
            caller: self.caller,
            operation: self.operation,
            chain,
        }
    }
}

/// Builder after specifying the chain
pub struct ScopedRequest<'a> {
    caller: &'a Caller,
    operation: Operation,
    chain: &'a AncestorChain,
}

impl ScopedRequest<'_> {
    /// Ask the resource type and translate its answer.
    ///
    /// Never cached: the answer depends on the live chain and caller state.
    pub async fn check<R>(self, resource: &R) -> Result<(), AuthError>
    where
        R: Authorize + ?Sized,
    {
        let allowed = resource
            .is_authorized(self.caller, self.operation, self.chain)
            .await?;

        if !allowed {
            debug!(
                user_id = ?self.caller.user_id(),
                operation = self.operation.origin(),
                depth = self.chain.len(),
                "authorization denied"
            );
            return Err(AuthError::Forbidden);
        }

        Ok(())
    }
}
