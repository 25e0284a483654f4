use thiserror::Error;

use crate::kernel::StoreError;

/// Authentication and authorization failures
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown user, wrong password, unconfirmed account or no valid session.
    /// Deliberately carries no detail.
    #[error("unauthenticated")]
    NotAuthenticated,

    #[error("user has no authority to perform request")]
    Forbidden,

    /// The authorization check itself could not be evaluated
    #[error("authorization lookup failed: {0}")]
    Lookup(#[from] StoreError),
}
