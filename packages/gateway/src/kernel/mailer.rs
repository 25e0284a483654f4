use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::BaseMailer;

/// Why a one-time token was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    EmailConfirmation,
    PasswordReset,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::EmailConfirmation => "email_confirmation",
            TokenPurpose::PasswordReset => "password_reset",
        }
    }
}

/// Mailer that records deliveries in the log instead of sending them.
///
/// The token itself is never logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl BaseMailer for LogMailer {
    async fn send_token(&self, to: &str, _token: &str, purpose: TokenPurpose) -> Result<()> {
        info!(recipient = %to, purpose = purpose.as_str(), "one-time token issued");
        Ok(())
    }
}
