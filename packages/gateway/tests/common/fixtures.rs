//! Request builders and seeded accounts.

use axum::body::Body;
use axum::http::{header, Method, Request};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{Duration, Utc};
use gateway_core::common::auth::SUPER_USER_LEVEL;
use gateway_core::common::Message;
use gateway_core::domains::users::models::NewUser;
use gateway_core::domains::users::User;
use gateway_core::kernel::{BaseUserStore, MemoryStore};
use serde_json::Value;

pub const PASSWORD: &str = "correct horse battery";

pub async fn unconfirmed_user(store: &MemoryStore, username: &str) -> User {
    store
        .insert_user(NewUser::new(username, PASSWORD), Utc::now())
        .await
        .unwrap()
}

pub async fn confirmed_user(store: &MemoryStore, username: &str) -> User {
    let user = unconfirmed_user(store, username).await;
    store.confirm_email(user.id, Utc::now()).await.unwrap();
    store.find_user(user.id).await.unwrap()
}

pub async fn super_user(store: &MemoryStore, username: &str) -> User {
    let user = store
        .insert_user(
            NewUser::new(username, PASSWORD).with_auth_level(SUPER_USER_LEVEL),
            Utc::now(),
        )
        .await
        .unwrap();
    store.confirm_email(user.id, Utc::now()).await.unwrap();
    store.find_user(user.id).await.unwrap()
}

/// `{timestamp, data}` stamped now
pub fn envelope(data: Value) -> Value {
    serde_json::to_value(Message::new(&data).unwrap()).unwrap()
}

/// `{timestamp, data}` stamped `age` ago; negative ages are in the future
pub fn envelope_aged(data: Value, age: Duration) -> Value {
    serde_json::to_value(Message::at(&data, Utc::now() - age).unwrap()).unwrap()
}

pub struct TestRequest {
    builder: axum::http::request::Builder,
    body: Body,
}

impl TestRequest {
    pub fn new(method: Method, uri: &str) -> Self {
        Self {
            builder: Request::builder().method(method).uri(uri),
            body: Body::empty(),
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn put(uri: &str) -> Self {
        Self::new(Method::PUT, uri)
    }

    pub fn delete(uri: &str) -> Self {
        Self::new(Method::DELETE, uri)
    }

    pub fn basic(mut self, username: &str, password: &str) -> Self {
        let encoded = STANDARD.encode(format!("{username}:{password}"));
        self.builder = self
            .builder
            .header(header::AUTHORIZATION, format!("Basic {encoded}"));
        self
    }

    /// Accepts either a bare `name=value` pair or a full `Set-Cookie` value
    pub fn cookie(mut self, cookie: &str) -> Self {
        let pair = cookie.split(';').next().unwrap_or_default().to_string();
        self.builder = self.builder.header(header::COOKIE, pair);
        self
    }

    pub fn header(mut self, name: header::HeaderName, value: &str) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.builder = self
            .builder
            .header(header::CONTENT_TYPE, "application/json");
        self.body = Body::from(serde_json::to_vec(&body).unwrap());
        self
    }

    pub fn raw(mut self, body: &'static str) -> Self {
        self.body = Body::from(body);
        self
    }

    pub fn build(self) -> Request<Body> {
        self.builder.body(self.body).unwrap()
    }
}
