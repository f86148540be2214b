use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
struct AuthError {
    status: &'static str,
    message: &'static str,
}

/// Constant-time byte comparison to prevent timing attacks on API key validation.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Middleware that validates the `x-api-key` header against the configured keys.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok());

    let authenticated = match presented {
        Some(key) => state
            .settings
            .api_keys
            .iter()
            .any(|valid| constant_time_eq(key.as_bytes(), valid.as_bytes())),
        None => false,
    };

    if !authenticated {
        let body = AuthError {
            status: "error",
            message: "Invalid API key",
        };
        return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    }

    next.run(request).await
}
