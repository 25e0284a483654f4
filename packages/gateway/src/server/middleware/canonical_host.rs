use axum::extract::{Request, State};
use axum::http::uri::PathAndQuery;
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

/// Redirect `a.b.c` hosts to the canonical `b.c`.
///
/// Any other host shape passes through untouched.
pub async fn canonical_host_middleware(
    State(protocol): State<String>,
    request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    let Some(target) = canonical_target(&protocol, host, request.uri().path_and_query()) else {
        return next.run(request).await;
    };

    debug!(host, target = %target, "redirecting to canonical host");
    match HeaderValue::from_str(&target) {
        Ok(location) => (
            StatusCode::PERMANENT_REDIRECT,
            [(header::LOCATION, location)],
        )
            .into_response(),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

fn canonical_target(
    protocol: &str,
    host: &str,
    path: Option<&PathAndQuery>,
) -> Option<String> {
    let labels: Vec<&str> = host.split('.').collect();
    let [_, domain, tld] = labels.as_slice() else {
        return None;
    };
    let path = path.map(|p| p.as_str()).unwrap_or("/");
    Some(format!("{protocol}://{domain}.{tld}{path}"))
}
