pub mod memory;
pub mod redis;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use shared::types::{StoreBackendKind, StoreConfig};

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<::redis::RedisError> for StoreError {
    fn from(err: ::redis::RedisError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Key-value store with per-key TTL that tracks live session tokens.
///
/// The store must provide atomic per-key writes, reads and deletes, and it
/// owns expiry: once a key's TTL has elapsed `contains` must report false
/// without anyone calling `remove`.
pub trait RevocationStore: Send + Sync {
    /// Mark `key` live for `ttl`.
    fn register(&self, key: &str, ttl: Duration)
    -> impl Future<Output = Result<(), StoreError>> + Send;

    fn contains(&self, key: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// One round trip to the backing store.
    fn ping(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// The backend picked at startup from `[store]`.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    Memory(MemoryStore),
    Redis(RedisStore),
}

impl StoreBackend {
    pub async fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        match config.backend {
            StoreBackendKind::Memory => {
                info!("Using in-memory revocation store");
                Ok(Self::Memory(MemoryStore::default()))
            }
            StoreBackendKind::Redis => {
                info!("Using redis revocation store at {}", config.redis_url);
                let store =
                    RedisStore::connect(&config.redis_url, config.resolved_password()).await?;
                Ok(Self::Redis(store))
            }
        }
    }
}

impl RevocationStore for StoreBackend {
    async fn register(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        match self {
            Self::Memory(s) => s.register(key, ttl).await,
            Self::Redis(s) => s.register(key, ttl).await,
        }
    }

    async fn contains(&self, key: &str) -> Result<bool, StoreError> {
        match self {
            Self::Memory(s) => s.contains(key).await,
            Self::Redis(s) => s.contains(key).await,
        }
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match self {
            Self::Memory(s) => s.remove(key).await,
            Self::Redis(s) => s.remove(key).await,
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        match self {
            Self::Memory(s) => s.ping().await,
            Self::Redis(s) => s.ping().await,
        }
    }
}
