use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{Stamped, UserId};
use crate::domains::entity::Record;
use crate::domains::users::models::User;

/// User wire representation
///
/// `password` is accepted on input and never serialized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    #[serde(default)]
    pub email_confirmed: bool,

    #[serde(default)]
    pub accepted_terms: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_news: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_level: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_time: Option<DateTime<Utc>>,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        Self {
            id: Some(user.id),
            username: Some(user.username),
            password: None,
            email_confirmed: user.email_confirmed,
            accepted_terms: user.accepted_terms,
            accepted_news: Some(user.accepted_news),
            country_code: user.country_code,
            auth_level: Some(user.auth_level),
            creation_time: Some(user.creation_time),
            modification_time: Some(user.modification_time),
        }
    }
}

impl Stamped for UserData {
    fn modification_time(&self) -> Option<DateTime<Utc>> {
        self.modification_time
    }
}

impl Record for UserData {
    fn redact(&mut self) {
        self.password = None;
    }
}
