/// Authorization for the resource gateway
///
/// Every request flows through one choke point regardless of how the caller
/// was identified (basic credentials or session cookie):
///
/// ```rust,ignore
/// use crate::common::auth::{Gate, Operation};
///
/// Gate::new(&caller)
///     .can(Operation::Get)
///     .on(&chain)
///     .check(entity.as_ref())
///     .await?;
/// ```
///
/// The gate holds no resource rules of its own; each resource type answers
/// through its [`Authorize`] implementation.

mod errors;
mod gate;
mod identity;
mod operation;

pub use errors::AuthError;
pub use gate::{AccessRequest, Authorize, Gate, ScopedRequest};
pub use identity::{Account, Caller, DEFAULT_AUTH_LEVEL, SUPER_USER_LEVEL};
pub use operation::Operation;
