use axum::{
    Json,
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::{debug, error, warn};

use crate::{ErrorResponse, messages};

/// Normalises responses produced by framework layers (body limit, timeout,
/// panics) into the JSON error envelope handlers already use.
pub async fn error_handling_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let path = req.uri().path().to_owned();
    let method = req.method().clone();

    let response = next.run(req).await;

    debug!(
        "Request completed: {} {} - Status: {} - Time: {:?}",
        method,
        path,
        response.status(),
        start.elapsed()
    );

    let status = response.status();
    if !is_framework_error(&response) {
        return response;
    }

    match status {
        StatusCode::PAYLOAD_TOO_LARGE => {
            warn!("Request body too large: {} {}", method, path);
            envelope(status, messages::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE")
        }
        StatusCode::REQUEST_TIMEOUT => {
            warn!("Request timed out: {} {}", method, path);
            envelope(status, messages::REQUEST_TIMEOUT, "REQUEST_TIMEOUT")
        }
        s if s.is_server_error() => {
            error!("Server error occurred: {} {} - {}", method, path, s);
            envelope(
                StatusCode::INTERNAL_SERVER_ERROR,
                messages::GENERAL_ERROR,
                "SERVER_ERROR",
            )
        }
        _ => response,
    }
}

// Handler errors are already JSON; only plain bodies from layers get rewritten.
fn is_framework_error(response: &Response) -> bool {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return false;
    }

    !response
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

fn envelope(status: StatusCode, message: &str, code: &str) -> Response {
    (status, Json(ErrorResponse::new(message, code))).into_response()
}
