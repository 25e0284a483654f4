use std::sync::OnceLock;

use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};

use crate::common::credentials::Digest;
use crate::common::{Account, AuthError};
use crate::kernel::{BaseUserStore, StoreError};

/// `(username, password)` from a `Basic` authorization header
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Verified in place of a missing user so unknown names cost the same
fn placeholder_digest() -> &'static Digest {
    static PLACEHOLDER: OnceLock<Digest> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Digest::password("placeholder"))
}

/// Check a username and password against the user store.
///
/// Unknown user, wrong password and (when required) unconfirmed email all
/// yield the same `NotAuthenticated`.
pub async fn verify_credentials(
    users: &dyn BaseUserStore,
    username: &str,
    password: &str,
    require_confirmed: bool,
) -> Result<Account, AuthError> {
    let user = match users.find_user_by_name(username).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            let _ = placeholder_digest().verify(password);
            debug!("credentials for unknown user");
            return Err(AuthError::NotAuthenticated);
        }
        Err(e) => return Err(AuthError::Lookup(e)),
    };

    if !user.password().verify(password) {
        warn!(user_id = %user.id, "rejected password");
        return Err(AuthError::NotAuthenticated);
    }

    if require_confirmed && !user.email_confirmed {
        debug!(user_id = %user.id, "credentials for unconfirmed user");
        return Err(AuthError::NotAuthenticated);
    }

    Ok(Account::from(&user))
}
