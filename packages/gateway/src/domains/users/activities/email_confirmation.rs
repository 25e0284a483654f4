use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::TokenError;
use crate::common::UserId;
use crate::kernel::BaseUserStore;

/// Confirm a user's email with the token mailed at registration.
pub async fn confirm_email(
    users: &dyn BaseUserStore,
    user_id: UserId,
    token: &str,
    at: DateTime<Utc>,
) -> Result<(), TokenError> {
    if token.is_empty() {
        return Err(TokenError::Missing);
    }

    let user = users.find_user(user_id).await?;
    let matches = user.token().is_some_and(|digest| digest.verify(token));
    if !matches {
        warn!(user_id = %user_id, "email confirmation with invalid token");
        return Err(TokenError::Invalid);
    }

    users.confirm_email(user_id, at).await?;
    info!(user_id = %user_id, "email confirmed");
    Ok(())
}
