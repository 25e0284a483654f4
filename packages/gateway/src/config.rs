use anyhow::{bail, Context, Result};
use chrono::Duration;
use dotenvy::dotenv;
use std::env;
use std::fmt;

use crate::common::message::{Freshness, DEFAULT_MAX_AGE_SECS};

/// Application configuration loaded from environment variables
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    /// When absent the server runs against the in-memory store.
    pub database_url: Option<String>,
    pub app_name: String,
    pub session_secret: String,
    pub session_ttl: Duration,
    pub message_max_age: Duration,
    pub debug_mode: bool,
    pub canonical_protocol: String,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            database_url: env::var("DATABASE_URL").ok(),
            app_name: env::var("APP_NAME").context("APP_NAME must be set")?,
            session_secret: env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?,
            session_ttl: hours(
                "SESSION_TTL_HOURS",
                &env::var("SESSION_TTL_HOURS").unwrap_or_else(|_| "24".to_string()),
            )?,
            message_max_age: seconds(
                "MESSAGE_MAX_AGE_SECS",
                &env::var("MESSAGE_MAX_AGE_SECS")
                    .unwrap_or_else(|_| DEFAULT_MAX_AGE_SECS.to_string()),
            )?,
            debug_mode: env::var("DEBUG_MODE")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            canonical_protocol: env::var("CANONICAL_PROTOCOL")
                .unwrap_or_else(|_| "https".to_string()),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("app_name", &self.app_name)
            .field("session_ttl", &self.session_ttl)
            .field("message_max_age", &self.message_max_age)
            .field("debug_mode", &self.debug_mode)
            .field("canonical_protocol", &self.canonical_protocol)
            .field("allowed_origins", &self.allowed_origins)
            .finish_non_exhaustive()
    }
}

/// Non-negative whole seconds
fn seconds(name: &str, value: &str) -> Result<Duration> {
    let count = non_negative(name, value)?;
    Duration::try_seconds(count).with_context(|| format!("{name} is out of range"))
}

/// Non-negative whole hours
fn hours(name: &str, value: &str) -> Result<Duration> {
    let count = non_negative(name, value)?;
    Duration::try_hours(count).with_context(|| format!("{name} is out of range"))
}

fn non_negative(name: &str, value: &str) -> Result<i64> {
    let count: i64 = value
        .trim()
        .parse()
        .with_context(|| format!("{name} must be a valid number"))?;
    if count < 0 {
        bail!("{name} must not be negative");
    }
    Ok(count)
}

/// Request-independent settings, built once at startup and shared read-only.
#[derive(Clone)]
pub struct Settings {
    pub cookie_name: String,
    pub session_secret: String,
    pub session_ttl: Duration,
    pub freshness: Freshness,
    /// Attach underlying error text to error bodies. Never enable in production.
    pub diagnostics: bool,
    pub canonical_protocol: String,
}

impl Settings {
    pub fn new(app_name: &str, session_secret: impl Into<String>) -> Self {
        Self {
            cookie_name: session_cookie_name(app_name),
            session_secret: session_secret.into(),
            session_ttl: Duration::hours(24),
            freshness: Freshness::default(),
            diagnostics: false,
            canonical_protocol: "https".to_string(),
        }
    }

    pub fn with_freshness(mut self, freshness: Freshness) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        let mut settings = Settings::new(&config.app_name, config.session_secret.clone())
            .with_freshness(Freshness::new(config.message_max_age))
            .with_diagnostics(config.debug_mode)
            .with_session_ttl(config.session_ttl);
        settings.canonical_protocol = config.canonical_protocol.clone();
        settings
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("cookie_name", &self.cookie_name)
            .field("session_ttl", &self.session_ttl)
            .field("freshness", &self.freshness)
            .field("diagnostics", &self.diagnostics)
            .field("canonical_protocol", &self.canonical_protocol)
            .finish_non_exhaustive()
    }
}

/// Session cookie name: `_` + lowercased app name + `sessionid`
pub fn session_cookie_name(app_name: &str) -> String {
    format!("_{}sessionid", app_name.trim().to_lowercase())
}
