use chrono::{DateTime, Utc};

use crate::common::{SessionId, UserId};

/// Session model
///
/// `user_id` is `None` for anonymous sessions. `data` is opaque side-data
/// carried across a redirect; it is consumed with read-and-clear semantics.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub user_id: Option<UserId>,
    pub data: Vec<u8>,
    pub creation_time: DateTime<Utc>,
    pub modification_time: DateTime<Utc>,
}

impl Session {
    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}
