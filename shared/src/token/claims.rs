use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Claims that carry an expiry the codec must enforce.
pub trait Expiring {
    /// Unix timestamp (seconds) at and after which the claims are dead.
    fn expires_at(&self) -> u64;
}

/// Privilege level embedded in a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
}

impl Role {
    /// Role for an identity with the given moderator flag.
    pub fn from_privileges(is_moderator: bool) -> Self {
        if is_moderator {
            Self::Moderator
        } else {
            Self::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
        }
    }

    pub fn is_moderator(&self) -> bool {
        matches!(self, Self::Moderator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "moderator" => Ok(Self::Moderator),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// The single account action an email token authorises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailPurpose {
    Confirmation,
    PasswordReset,
}

impl EmailPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmation => "confirmation",
            Self::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for EmailPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims embedded in every session token.
///
/// Verification is two-step: the codec checks the tag and `exp`, then the
/// session store checks that a revocation entry keyed by the full token
/// string still exists. Deleting that entry invalidates the token before
/// `exp` is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Numeric identity of the signed-in user.
    pub sub: u32,

    /// Privileges at login time. A promoted or demoted user keeps the old
    /// role until the session ends and they log in again.
    pub role: Role,

    /// Random per-session id. Two sessions minted in the same second for
    /// the same identity still get distinct tokens, and therefore distinct
    /// revocation entries.
    pub jti: String,

    /// Issued-at (Unix timestamp, seconds).
    pub iat: u64,

    /// Expiry (Unix timestamp, seconds).
    pub exp: u64,
}

impl Expiring for SessionClaims {
    fn expires_at(&self) -> u64 {
        self.exp
    }
}

/// Claims embedded in confirmation and password-reset links.
///
/// There is no server-side state for these: a valid tag, an unexpired
/// `exp` and a matching `purpose` are all that is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailClaims {
    pub sub: u32,
    pub email: String,
    pub purpose: EmailPurpose,
    pub iat: u64,
    pub exp: u64,
}

impl Expiring for EmailClaims {
    fn expires_at(&self) -> u64 {
        self.exp
    }
}
