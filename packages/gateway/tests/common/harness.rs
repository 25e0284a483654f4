//! Router-level test harness.
//!
//! Each test gets a fresh in-memory store and a mailer that records every
//! token it is asked to deliver. Requests go straight through the axum
//! `Router` with `oneshot`; no socket is bound.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use gateway_core::kernel::{BaseMailer, MemoryStore, ServerDeps, TokenPurpose};
use gateway_core::server::build_app;
use gateway_core::Settings;
use http_body_util::BodyExt;
use test_context::AsyncTestContext;
use tower::ServiceExt;

/// A delivered one-time token
#[derive(Debug, Clone)]
pub struct SentToken {
    pub to: String,
    pub token: String,
    pub purpose: TokenPurpose,
}

/// Mailer that keeps every token in memory
#[derive(Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<SentToken>>,
}

impl CapturingMailer {
    pub fn last_token(&self, to: &str, purpose: TokenPurpose) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|s| s.to == to && s.purpose == purpose)
            .map(|s| s.token.clone())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl BaseMailer for CapturingMailer {
    async fn send_token(&self, to: &str, token: &str, purpose: TokenPurpose) -> Result<()> {
        self.sent.lock().unwrap().push(SentToken {
            to: to.to_string(),
            token: token.to_string(),
            purpose,
        });
        Ok(())
    }
}

/// Test harness that owns the store behind a freshly built router.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let response = ctx.send(TestRequest::get("/health").build()).await;
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<CapturingMailer>,
    pub settings: Settings,
    router: Router,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
    }

    async fn teardown(self) {
        // Store is dropped with the harness
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_settings(Settings::new("TestApp", "test_secret_key"))
    }

    pub fn with_settings(settings: Settings) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(CapturingMailer::default());
        let deps = ServerDeps::new(store.clone(), mailer.clone());
        let router = build_app(deps, settings.clone(), Vec::new());

        Self {
            store,
            mailer,
            settings,
            router,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

impl TestResponse {
    /// First error description in the body
    pub fn description(&self) -> &str {
        self.body["error"][0]["description"].as_str().unwrap_or_default()
    }

    /// `name=value` of the cookie set by this response, if any
    pub fn cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }

    pub fn set_cookie_header(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
    }
}
