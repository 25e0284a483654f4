//! The `{timestamp, data}` envelope carried by every write request.
//!
//! The timestamp is nanoseconds since the Unix epoch (UTC). An envelope is
//! accepted only if it is not from the future and not older than the
//! configured freshness window. Updates additionally require the payload's
//! modification time to predate the envelope, which guards against a stale
//! write silently winning a race.

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MAX_AGE_SECS: i64 = 30 * 60;

/// Wire envelope for POST and PUT bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub timestamp: i64,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Message {
    /// Wraps `data` in an envelope stamped with the current time.
    pub fn new<T: Serialize>(data: &T) -> serde_json::Result<Self> {
        Self::at(data, Utc::now())
    }

    pub fn at<T: Serialize>(data: &T, timestamp: DateTime<Utc>) -> serde_json::Result<Self> {
        Ok(Self {
            timestamp: nanos(timestamp),
            data: serde_json::to_value(data)?,
        })
    }
}

/// Payloads that carry the last recorded modification time of their entity.
pub trait Stamped {
    /// `None` is the zero time: the client never saw a stored version.
    fn modification_time(&self) -> Option<DateTime<Utc>>;
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("unable to decode request JSON")]
    Malformed(#[source] serde_json::Error),

    #[error("messages from the future are not allowed")]
    FromTheFuture { timestamp: i64, now: i64 },

    #[error("message is too old")]
    TooOld { age_ns: i64, max_age_ns: i64 },

    #[error("unable to decode message data")]
    Payload(#[source] serde_json::Error),

    #[error("got zero modification time on update")]
    ZeroModificationTime,

    #[error("message timestamp before entity modification")]
    StaleModification { timestamp: i64, modified: i64 },
}

impl EnvelopeError {
    /// Underlying detail, for diagnostic error bodies only.
    pub fn detail(&self) -> String {
        match self {
            EnvelopeError::Malformed(e) | EnvelopeError::Payload(e) => e.to_string(),
            EnvelopeError::FromTheFuture { timestamp, now } => {
                format!("timestamp {timestamp} is ahead of server time {now}")
            }
            EnvelopeError::TooOld { age_ns, max_age_ns } => format!(
                "message is {} seconds old, limit is {} seconds",
                age_ns / 1_000_000_000,
                max_age_ns / 1_000_000_000
            ),
            EnvelopeError::ZeroModificationTime => self.to_string(),
            EnvelopeError::StaleModification { timestamp, modified } => {
                format!("timestamp {timestamp} is not after modification {modified}")
            }
        }
    }
}

/// A validated envelope and its decoded payload.
#[derive(Debug)]
pub struct Opened<T> {
    pub timestamp: DateTime<Utc>,
    pub payload: T,
}

/// Freshness window applied to incoming envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freshness {
    max_age: Duration,
}

impl Default for Freshness {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_MAX_AGE_SECS))
    }
}

impl Freshness {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn open<T: DeserializeOwned>(&self, body: &[u8]) -> Result<Opened<T>, EnvelopeError> {
        self.open_at(body, Utc::now())
    }

    pub fn open_update<T>(&self, body: &[u8]) -> Result<Opened<T>, EnvelopeError>
    where
        T: DeserializeOwned + Stamped,
    {
        self.open_update_at(body, Utc::now())
    }

    /// Decodes and validates an envelope against `now`.
    pub fn open_at<T: DeserializeOwned>(
        &self,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Opened<T>, EnvelopeError> {
        let message: Message = serde_json::from_slice(body).map_err(EnvelopeError::Malformed)?;

        let now_ns = nanos(now);
        if message.timestamp > now_ns {
            return Err(EnvelopeError::FromTheFuture {
                timestamp: message.timestamp,
                now: now_ns,
            });
        }

        let age_ns = now_ns.saturating_sub(message.timestamp);
        let max_age_ns = self.max_age.num_nanoseconds().unwrap_or(i64::MAX);
        if age_ns > max_age_ns {
            return Err(EnvelopeError::TooOld { age_ns, max_age_ns });
        }

        let payload = serde_json::from_value(message.data).map_err(EnvelopeError::Payload)?;

        Ok(Opened {
            timestamp: DateTime::from_timestamp_nanos(message.timestamp),
            payload,
        })
    }

    /// Like [`Freshness::open_at`], then requires the payload's modification
    /// time to be set and strictly before the envelope timestamp.
    pub fn open_update_at<T>(
        &self,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Opened<T>, EnvelopeError>
    where
        T: DeserializeOwned + Stamped,
    {
        let opened: Opened<T> = self.open_at(body, now)?;

        let modified = opened
            .payload
            .modification_time()
            .ok_or(EnvelopeError::ZeroModificationTime)?;

        let timestamp = nanos(opened.timestamp);
        let modified = nanos(modified);
        if modified >= timestamp {
            return Err(EnvelopeError::StaleModification {
                timestamp,
                modified,
            });
        }

        Ok(opened)
    }
}

/// Nanoseconds since the epoch. Saturates outside the representable range
/// (years before 1677 or after 2262).
pub fn nanos(at: DateTime<Utc>) -> i64 {
    at.timestamp_nanos_opt().unwrap_or(if at.timestamp() < 0 {
        i64::MIN
    } else {
        i64::MAX
    })
}
