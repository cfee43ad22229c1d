use thiserror::Error;

use super::claims::EmailPurpose;

/// Every way a token operation can fail.
///
/// `InvalidToken` deliberately covers malformed input, a bad or missing
/// tag, a wrong key and an expired timestamp. The `detail` field is for
/// local diagnostics only and is excluded from `Display`, so nothing that
/// formats the error for a caller can tell those causes apart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token")]
    InvalidToken { detail: String },

    /// Email token presented for the wrong action. Reported to callers
    /// exactly like `InvalidToken`.
    #[error("invalid token")]
    PurposeMismatch {
        expected: EmailPurpose,
        actual: EmailPurpose,
    },

    /// Signature verifies but the revocation entry is gone.
    #[error("session revoked")]
    SessionRevoked,

    #[error("revocation store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl TokenError {
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::InvalidToken {
            detail: detail.into(),
        }
    }

    /// Internal description for log lines. Never put this in a response.
    pub fn detail(&self) -> String {
        match self {
            Self::InvalidToken { detail } => detail.clone(),
            Self::PurposeMismatch { expected, actual } => {
                format!("purpose mismatch: expected {}, got {}", expected, actual)
            }
            Self::SessionRevoked => "no revocation entry".to_string(),
            Self::StoreUnavailable(reason) => reason.clone(),
            Self::Signing(reason) => reason.clone(),
        }
    }

    /// True for every outcome that means "this caller is not authenticated".
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken { .. } | Self::PurposeMismatch { .. } | Self::SessionRevoked
        )
    }

    /// The only error classification that crosses a service boundary.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidToken { .. } | Self::PurposeMismatch { .. } | Self::SessionRevoked => {
                "INVALID_TOKEN"
            }
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Signing(_) => "INTERNAL_ERROR",
        }
    }
}
