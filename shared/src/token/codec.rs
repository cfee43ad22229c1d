use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::claims::Expiring;
use super::error::TokenError;

/// Signs and verifies claim sets as compact HS256 JWTs.
///
/// A token is `base64url(header).base64url(claims).base64url(tag)` where the
/// tag is HMAC-SHA256 over the first two segments. The secret is fixed at
/// construction and never changes, so a single codec can be shared by every
/// concurrent request without locking.
///
/// Decoding never reveals why a token was rejected: malformed input, a
/// tampered payload, a wrong key, a foreign algorithm and an expired `exp`
/// all come back as [`TokenError::InvalidToken`]. Tag comparison is done by
/// the HMAC verifier in constant time.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock in `decode`.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Serialize and sign `claims`.
    pub fn encode<C: Serialize>(&self, claims: &C) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify the tag, parse the claims and reject them if `now` is at or
    /// past their expiry.
    pub fn decode<C>(&self, token: &str, now: u64) -> Result<C, TokenError>
    where
        C: DeserializeOwned + Expiring,
    {
        let data = jsonwebtoken::decode::<C>(token, &self.decoding, &self.validation).map_err(
            |e| {
                debug!("Token rejected by codec: {:?}", e.kind());
                TokenError::invalid(format!("{:?}", e.kind()))
            },
        )?;

        let exp = data.claims.expires_at();
        if now >= exp {
            debug!("Token rejected by codec: expired at {} (now {})", exp, now);
            return Err(TokenError::invalid(format!("expired at {}", exp)));
        }

        Ok(data.claims)
    }
}
