use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::TokenError;
use crate::common::credentials::{self, Digest};
use crate::common::UserId;
use crate::kernel::{BaseMailer, BaseUserStore, StoreError, TokenPurpose};

/// Issue and mail a password reset token. Requires a confirmed email.
pub async fn issue_reset_token(
    users: &dyn BaseUserStore,
    mailer: &dyn BaseMailer,
    user_id: UserId,
    at: DateTime<Utc>,
) -> Result<(), TokenError> {
    let user = users.find_user(user_id).await?;
    if !user.email_confirmed {
        return Err(TokenError::EmailNotConfirmed);
    }

    let token = credentials::one_time_token();
    users.set_token(user_id, Digest::new(&token), at).await?;

    mailer
        .send_token(&user.username, &token, TokenPurpose::PasswordReset)
        .await
        .map_err(StoreError::Other)?;

    info!(user_id = %user_id, "password reset token issued");
    Ok(())
}

/// Replace the password using an outstanding reset token.
pub async fn reset_password(
    users: &dyn BaseUserStore,
    user_id: UserId,
    token: &str,
    password: &str,
    at: DateTime<Utc>,
) -> Result<(), TokenError> {
    if token.is_empty() {
        return Err(TokenError::Missing);
    }
    if password.is_empty() {
        return Err(TokenError::MissingPassword);
    }

    let user = users.find_user(user_id).await?;
    if !user.email_confirmed {
        return Err(TokenError::EmailNotConfirmed);
    }
    if !user.token().is_some_and(|digest| digest.verify(token)) {
        warn!(user_id = %user_id, "password reset with invalid token");
        return Err(TokenError::Invalid);
    }

    users.reset_password(user_id, Digest::password(password), at).await?;
    info!(user_id = %user_id, "password reset");
    Ok(())
}
