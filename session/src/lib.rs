//! Session token service.
//!
//! Mints signed session tokens, checks them against a TTL revocation store
//! and revokes them on logout. Exposed over JSON/HTTP by [`run`].
pub mod handlers;
pub mod session;
pub mod store;

use std::sync::Arc;

use anyhow::Result;
use hyper::Request;
use hyper::body::Incoming;
use tokio::net::TcpListener;

use shared::types::{ConfigError, SessionConfig};
use shared::{SystemClock, TokenCodec};

pub use session::SessionStore;
pub use store::{MemoryStore, RedisStore, RevocationStore, StoreBackend, StoreError};

/// Build the session store from `[session]` with the wall clock.
///
/// Fails when no signing secret of sufficient length is configured.
pub fn build_sessions<S: RevocationStore>(
    config: &SessionConfig,
    store: S,
) -> Result<SessionStore<S>, ConfigError> {
    let secret = config.signing_secret()?;
    Ok(SessionStore::new(
        TokenCodec::new(secret.as_bytes()),
        store,
        config.ttl(),
        Arc::new(SystemClock),
    ))
}

/// Serve the session RPC surface on `listener` until accept fails.
pub async fn run<S>(
    listener: TcpListener,
    sessions: Arc<SessionStore<S>>,
    config: &SessionConfig,
) -> Result<()>
where
    S: RevocationStore + 'static,
{
    shared::rpc::serve(listener, config.request_timeout(), move |req: Request<Incoming>| {
        let sessions = sessions.clone();
        async move { handlers::handle(req, sessions).await }
    })
    .await
}
