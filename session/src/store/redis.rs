use std::fmt;
use std::future::Future;
use std::time::Duration;

use ::redis::aio::ConnectionManager;
use ::redis::{Client, IntoConnectionInfo};

use super::{RevocationStore, StoreError};

/// Liveness marker stored against every session token.
const ACTIVE: &str = "active";

/// Upper bound for a single store round trip.
const OP_TIMEOUT: Duration = Duration::from_millis(500);

/// Redis-backed revocation store. Expiry is delegated to Redis key TTLs.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    pub async fn connect(url: &str, password: Option<String>) -> Result<Self, StoreError> {
        let mut info = url.into_connection_info()?;
        if password.is_some() {
            info.redis.password = password;
        }

        let client = Client::open(info)?;
        let conn = bounded(ConnectionManager::new(client)).await?;
        Ok(Self { conn })
    }
}

async fn bounded<T, F>(op: F) -> Result<T, StoreError>
where
    F: Future<Output = ::redis::RedisResult<T>>,
{
    match tokio::time::timeout(OP_TIMEOUT, op).await {
        Ok(result) => result.map_err(StoreError::from),
        Err(_) => Err(StoreError::Unavailable(format!(
            "redis did not answer within {:?}",
            OP_TIMEOUT
        ))),
    }
}

impl RevocationStore for RedisStore {
    async fn register(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let millis = ttl.as_millis().max(1) as u64;
        let mut cmd = ::redis::cmd("SET");
        cmd.arg(key).arg(ACTIVE).arg("PX").arg(millis);
        let _: () = bounded(cmd.query_async(&mut conn)).await?;
        Ok(())
    }

    async fn contains(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = ::redis::cmd("EXISTS");
        cmd.arg(key);
        let found: i64 = bounded(cmd.query_async(&mut conn)).await?;
        Ok(found > 0)
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = ::redis::cmd("DEL");
        cmd.arg(key);
        let _removed: i64 = bounded(cmd.query_async(&mut conn)).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let cmd = ::redis::cmd("PING");
        let _pong: String = bounded(cmd.query_async(&mut conn)).await?;
        Ok(())
    }
}
