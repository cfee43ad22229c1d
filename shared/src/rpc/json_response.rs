use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode, header};
use serde::Serialize;
use tracing::{debug, error};

use crate::token::TokenError;
use crate::types::ErrorResponse;

/// Serialize any `Serialize` type and deliver it as a JSON response.
pub fn deliver_serialized_json<T: Serialize>(
    data: &T,
    status: StatusCode,
) -> Result<Response<Full<Bytes>>> {
    let json = serde_json::to_string(data).context("Failed to serialize response")?;

    debug!("Delivering serialized JSON response, size: {} bytes", json.len());

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)))
        .map_err(|e| anyhow!("Failed to build JSON response: {}", e))
}

/// Delivers a JSON error response with the specified error code, message, and status.
pub fn deliver_error_json(
    error_code: &str,
    message: &str,
    status: StatusCode,
) -> Result<Response<Full<Bytes>>> {
    if status.is_server_error() {
        error!(
            "Delivering error JSON: {} - {} ({})",
            status.as_u16(),
            error_code,
            message
        );
    } else {
        debug!(
            "Delivering error JSON: {} - {} ({})",
            status.as_u16(),
            error_code,
            message
        );
    }

    deliver_serialized_json(&ErrorResponse::new(error_code, message), status)
}

/// Map a token failure onto the wire. Only the external code is exposed.
pub fn deliver_token_error(err: &TokenError) -> Result<Response<Full<Bytes>>> {
    let status = match err {
        TokenError::InvalidToken { .. }
        | TokenError::PurposeMismatch { .. }
        | TokenError::SessionRevoked => StatusCode::UNAUTHORIZED,
        TokenError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        TokenError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    deliver_serialized_json(&ErrorResponse::from_token_error(err), status)
}

/// Last-resort 500 for when building a proper response failed.
pub fn internal_error() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(
        br#"{"status":"error","code":"INTERNAL_ERROR","message":"An internal error occurred"}"#,
    )));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    response
}
