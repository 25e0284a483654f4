use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{ClientId, Stamped, UserId};
use crate::domains::clients::models::{Client, ClientChanges, NewClient};
use crate::domains::entity::Record;

/// Client wire representation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ClientId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_time: Option<DateTime<Utc>>,
}

impl From<Client> for ClientData {
    fn from(client: Client) -> Self {
        Self {
            id: Some(client.id),
            user_id: Some(client.user_id),
            name: Some(client.name),
            notification_token: client.notification_token,
            os: client.os,
            sdk: client.sdk,
            creation_time: Some(client.creation_time),
            modification_time: Some(client.modification_time),
        }
    }
}

impl From<ClientData> for NewClient {
    fn from(data: ClientData) -> Self {
        Self {
            name: data.name.unwrap_or_default(),
            notification_token: data.notification_token,
            os: data.os,
            sdk: data.sdk,
        }
    }
}

impl From<ClientData> for ClientChanges {
    fn from(data: ClientData) -> Self {
        Self {
            name: data.name,
            notification_token: data.notification_token,
            os: data.os,
            sdk: data.sdk,
        }
    }
}

impl Stamped for ClientData {
    fn modification_time(&self) -> Option<DateTime<Utc>> {
        self.modification_time
    }
}

impl Record for ClientData {}
