use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use shared::token::{SessionClaims, fingerprint};
use shared::{Clock, Role, TokenCodec, TokenError};

use crate::store::{RevocationStore, StoreError};

/// Issues, verifies and revokes session tokens.
///
/// A token is only honoured while two things hold: the codec accepts it
/// (tag and `exp`) and the revocation store still has an entry for it.
/// The second check is what makes logout and TTL expiry effective even
/// though the signature keeps verifying.
///
/// Per-token states: issued → active → revoked (deleted) or expired (TTL
/// elapsed in the store). `verify` only succeeds in the active state.
#[derive(Debug)]
pub struct SessionStore<S> {
    codec: TokenCodec,
    store: S,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<S: RevocationStore> SessionStore<S> {
    pub fn new(codec: TokenCodec, store: S, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            codec,
            store,
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token for `identity` and register it.
    ///
    /// The token is returned only after the store write has completed. If
    /// the write fails nothing is returned, so no caller ever holds a token
    /// without a revocation entry.
    pub async fn create(&self, identity: u32, role: Role) -> Result<String, TokenError> {
        let now = self.clock.now();
        let claims = SessionClaims {
            sub: identity,
            role,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.ttl.as_secs(),
        };

        let token = self.codec.encode(&claims)?;

        self.store
            .register(&token, self.ttl)
            .await
            .map_err(|e| store_alert("create", identity, e))?;

        info!(identity, role = %role, "Created session {}", fingerprint(&token));
        Ok(token)
    }

    /// Identity and role carried by an active session token.
    ///
    /// Both come from the token itself; a role change only shows up after
    /// the user logs in again.
    pub async fn verify(&self, token: &str) -> Result<(u32, Role), TokenError> {
        let claims: SessionClaims = self.codec.decode(token, self.clock.now())?;

        let active = self
            .store
            .contains(token)
            .await
            .map_err(|e| store_alert("verify", claims.sub, e))?;

        if !active {
            warn!(
                identity = claims.sub,
                "Attempt to use revoked or expired session {}",
                fingerprint(token)
            );
            return Err(TokenError::SessionRevoked);
        }

        debug!(identity = claims.sub, role = %claims.role, "Verified session");
        Ok((claims.sub, claims.role))
    }

    /// Revoke a session. Deleting an already-revoked session succeeds.
    ///
    /// The token must still decode, which keeps arbitrary strings away from
    /// the store.
    pub async fn delete(&self, token: &str) -> Result<(), TokenError> {
        let claims: SessionClaims = self.codec.decode(token, self.clock.now())?;

        self.store
            .remove(token)
            .await
            .map_err(|e| store_alert("delete", claims.sub, e))?;

        info!(identity = claims.sub, "Deleted session {}", fingerprint(token));
        Ok(())
    }

    /// Single round trip to the backing store.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }
}

/// Store failures are infrastructure problems, not user errors.
fn store_alert(op: &str, identity: u32, err: StoreError) -> TokenError {
    error!(identity, "Revocation store failure during {}: {}", op, err);
    TokenError::StoreUnavailable(err.to_string())
}
