//! JSON response bodies shared by every API route.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error};

use super::error::ApiError;

/// `{timestamp, origin, status, data?, error?}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Unix seconds at the time the response was written
    pub timestamp: i64,
    pub origin: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Vec<ErrorEntry>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

pub fn success<T: Serialize>(origin: &str, data: T) -> Response {
    let body = ApiResponse {
        timestamp: Utc::now().timestamp(),
        origin: origin.to_string(),
        status: StatusCode::OK.as_u16(),
        data: Some(data),
        error: None,
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Render `err`; `debug` is attached only when `diagnostics` is set.
pub fn failure(origin: &str, err: &ApiError, diagnostics: bool) -> Response {
    let status = err.status();
    if status.is_server_error() {
        error!(origin, error = ?err, "request failed");
    } else {
        debug!(origin, status = status.as_u16(), error = %err, "request rejected");
    }

    let entry = ErrorEntry {
        description: err.description(),
        debug: if diagnostics { err.detail() } else { None },
    };
    let body: ApiResponse<()> = ApiResponse {
        timestamp: Utc::now().timestamp(),
        origin: origin.to_string(),
        status: status.as_u16(),
        data: None,
        error: Some(vec![entry]),
    };
    (status, Json(body)).into_response()
}

/// Attach a `Set-Cookie` header, if one was issued for this request.
pub fn with_cookie(mut response: Response, cookie: Option<HeaderValue>) -> Response {
    if let Some(cookie) = cookie {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}
