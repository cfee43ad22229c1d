pub mod claims;
pub mod codec;
pub mod email;
pub mod error;

pub use self::claims::{EmailClaims, EmailPurpose, Expiring, Role, SessionClaims};
pub use self::codec::TokenCodec;
pub use self::email::{EmailLifetimes, EmailTokens};
pub use self::error::TokenError;

/// Short, non-reversible handle for a token, safe to put in log lines.
///
/// Only the first characters of the signature segment are kept; the
/// payload and the full tag never reach the logs.
pub fn fingerprint(token: &str) -> String {
    let tag = token.rsplit('.').next().unwrap_or(token);
    let prefix: String = tag.chars().take(8).collect();
    format!("{}…", prefix)
}
