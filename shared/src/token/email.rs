use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::claims::{EmailClaims, EmailPurpose};
use super::codec::TokenCodec;
use super::error::TokenError;
use super::fingerprint;
use crate::clock::Clock;

/// How long each kind of email link stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailLifetimes {
    pub confirmation: Duration,
    pub password_reset: Duration,
}

impl EmailLifetimes {
    pub fn for_purpose(&self, purpose: EmailPurpose) -> Duration {
        match purpose {
            EmailPurpose::Confirmation => self.confirmation,
            EmailPurpose::PasswordReset => self.password_reset,
        }
    }
}

impl Default for EmailLifetimes {
    fn default() -> Self {
        Self {
            confirmation: Duration::from_secs(72 * 60 * 60),
            password_reset: Duration::from_secs(60 * 60),
        }
    }
}

/// Issues and verifies purpose-bound email tokens.
///
/// Stateless: nothing is recorded when a token is issued or accepted, so a
/// link keeps working until it expires, even after it has been used.
#[derive(Debug, Clone)]
pub struct EmailTokens {
    codec: TokenCodec,
    lifetimes: EmailLifetimes,
    clock: Arc<dyn Clock>,
}

impl EmailTokens {
    pub fn new(codec: TokenCodec, lifetimes: EmailLifetimes, clock: Arc<dyn Clock>) -> Self {
        Self {
            codec,
            lifetimes,
            clock,
        }
    }

    pub fn lifetimes(&self) -> &EmailLifetimes {
        &self.lifetimes
    }

    pub fn issue(
        &self,
        identity: u32,
        email: &str,
        purpose: EmailPurpose,
    ) -> Result<String, TokenError> {
        let now = self.clock.now();
        let claims = EmailClaims {
            sub: identity,
            email: email.to_string(),
            purpose,
            iat: now,
            exp: now + self.lifetimes.for_purpose(purpose).as_secs(),
        };

        let token = self.codec.encode(&claims)?;
        debug!(
            identity,
            purpose = %purpose,
            exp = claims.exp,
            "Issued email token {}",
            fingerprint(&token)
        );
        Ok(token)
    }

    /// Returns `(email, identity)` when `token` is valid for `expected`.
    pub fn verify(
        &self,
        token: &str,
        expected: EmailPurpose,
    ) -> Result<(String, u32), TokenError> {
        let claims: EmailClaims = self.codec.decode(token, self.clock.now())?;

        if claims.purpose != expected {
            warn!(
                identity = claims.sub,
                "Email token {} presented for {} but issued for {}",
                fingerprint(token),
                expected,
                claims.purpose
            );
            return Err(TokenError::PurposeMismatch {
                expected,
                actual: claims.purpose,
            });
        }

        Ok((claims.email, claims.sub))
    }
}
