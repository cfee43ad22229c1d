use serde::{Deserialize, Serialize};

use crate::token::TokenError;

/// Error body returned by both token services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            status: "error".to_string(),
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    /// Built from the external code alone; the internal detail is dropped.
    pub fn from_token_error(err: &TokenError) -> Self {
        let message = match err.code() {
            "INVALID_TOKEN" => "Invalid or expired token",
            "STORE_UNAVAILABLE" => "Session store unavailable",
            _ => "An internal error occurred",
        };
        Self::new(err.code(), message)
    }
}
