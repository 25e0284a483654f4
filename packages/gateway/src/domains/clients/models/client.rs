use chrono::{DateTime, Utc};

use crate::common::{ClientId, UserId};

/// Client model - a device or application registered by a user
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Client {
    pub id: ClientId,
    pub user_id: UserId,
    pub name: String,
    pub notification_token: Option<String>,
    pub os: Option<String>,
    pub sdk: Option<String>,

    pub creation_time: DateTime<Utc>,
    pub modification_time: DateTime<Utc>,
    pub deletion_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub name: String,
    pub notification_token: Option<String>,
    pub os: Option<String>,
    pub sdk: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ClientChanges {
    pub name: Option<String>,
    pub notification_token: Option<String>,
    pub os: Option<String>,
    pub sdk: Option<String>,
}
