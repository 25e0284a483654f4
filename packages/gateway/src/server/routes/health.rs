use std::time::Duration;

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::kernel::ServerDeps;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    store: StoreHealth,
}

#[derive(Serialize)]
pub struct StoreHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint
///
/// Returns 200 OK if the store answers within 5 seconds, 503 Service
/// Unavailable otherwise.
pub async fn health_handler(
    Extension(deps): Extension<ServerDeps>,
) -> (StatusCode, Json<HealthResponse>) {
    let store = match tokio::time::timeout(Duration::from_secs(5), deps.users.ping()).await {
        Ok(Ok(())) => StoreHealth {
            status: "ok".to_string(),
            error: None,
        },
        Ok(Err(e)) => {
            warn!(error = %e, "Store ping failed");
            StoreHealth {
                status: "error".to_string(),
                error: Some("Store unreachable".to_string()),
            }
        }
        Err(_) => StoreHealth {
            status: "error".to_string(),
            error: Some("Ping timeout (>5s)".to_string()),
        },
    };

    let is_healthy = store.status == "ok";
    let (status_code, overall) = if is_healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        status_code,
        Json(HealthResponse {
            status: overall.to_string(),
            store,
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::common::credentials::Digest;
    use crate::common::UserId;
    use crate::domains::users::models::{NewUser, User, UserChanges};
    use crate::kernel::{BaseUserStore, StoreError};

    /// Every call fails the way a dropped database connection does
    struct Unreachable;

    fn refused() -> StoreError {
        StoreError::Internal("connection refused by 10.0.0.7:5432".into())
    }

    #[async_trait]
    impl BaseUserStore for Unreachable {
        async fn insert_user(&self, _: NewUser, _: DateTime<Utc>) -> Result<User, StoreError> {
            Err(refused())
        }

        async fn find_user(&self, _: UserId) -> Result<User, StoreError> {
            Err(refused())
        }

        async fn find_user_by_name(&self, _: &str) -> Result<User, StoreError> {
            Err(refused())
        }

        async fn list_users(&self) -> Result<Vec<User>, StoreError> {
            Err(refused())
        }

        async fn update_user(
            &self,
            _: UserId,
            _: UserChanges,
            _: DateTime<Utc>,
            _: DateTime<Utc>,
        ) -> Result<User, StoreError> {
            Err(refused())
        }

        async fn delete_user(&self, _: UserId, _: DateTime<Utc>) -> Result<(), StoreError> {
            Err(refused())
        }

        async fn set_token(
            &self,
            _: UserId,
            _: Digest,
            _: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            Err(refused())
        }

        async fn confirm_email(&self, _: UserId, _: DateTime<Utc>) -> Result<(), StoreError> {
            Err(refused())
        }

        async fn reset_password(
            &self,
            _: UserId,
            _: Digest,
            _: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            Err(refused())
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(refused())
        }
    }

    #[tokio::test]
    async fn test_healthy_store() {
        let (status, Json(body)) = health_handler(Extension(ServerDeps::in_memory())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "healthy");
        assert!(body.store.error.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_details_stay_in_the_logs() {
        let mut deps = ServerDeps::in_memory();
        deps.users = Arc::new(Unreachable);

        let (status, Json(body)) = health_handler(Extension(deps)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "unhealthy");

        let rendered = serde_json::to_string(&body).unwrap();
        assert!(rendered.contains("Store unreachable"));
        assert!(!rendered.contains("10.0.0.7"));
        assert!(!rendered.contains("connection refused"));
    }
}
