//! One-time token flows for user accounts

pub mod email_confirmation;
pub mod password_reset;

pub use email_confirmation::confirm_email;
pub use password_reset::{issue_reset_token, reset_password};

use thiserror::Error;

use crate::kernel::StoreError;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token is required")]
    Missing,

    #[error("invalid token")]
    Invalid,

    #[error("email not confirmed")]
    EmailNotConfirmed,

    #[error("password is required")]
    MissingPassword,

    #[error(transparent)]
    Store(#[from] StoreError),
}
