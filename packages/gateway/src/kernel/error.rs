use thiserror::Error;

/// Failures reported by the persistent store collaborators
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("resource not found")]
    NotFound,

    /// Missing or nonexistent foreign reference
    #[error("key missing or unexisting: {0}")]
    Constraint(String),

    #[error("duplicated entry: {0}")]
    DuplicatedKey(String),

    #[error("terms not accepted")]
    TermsNotAccepted,

    /// The stored record changed at or after the write's envelope timestamp
    #[error("message timestamp before entity modification")]
    Stale,

    /// Any other business rule, reported to the caller verbatim
    #[error("{0}")]
    Rule(String),

    #[error("storage failure: {0}")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    pub fn rule(description: impl Into<String>) -> Self {
        StoreError::Rule(description.into())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::DuplicatedKey(db.constraint().unwrap_or_default().to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::Constraint(db.constraint().unwrap_or_default().to_string())
            }
            other => StoreError::Internal(Box::new(other)),
        }
    }
}
