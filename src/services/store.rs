use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The source key of an atomic rename did not exist.
    #[error("rename source missing")]
    SourceMissing,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Key-value store with per-key expiration backing the registration state
/// machine. Every write is an unconditional overwrite; the only multi-key
/// operation is the atomic rename used to promote a pending credential.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;
    /// Atomic: no observer ever sees both keys absent or both present.
    async fn rename_atomic(&self, old_key: &str, new_key: &str) -> Result<(), StoreError>;
    /// Idempotent; deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
    async fn health_check(&self) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct RedisStore {
    _client: Client,
    manager: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(config: &crate::config::RedisConfig) -> Result<Self, anyhow::Error> {
        tracing::info!(url = %config.url, "Connecting to Redis");
        let client = Client::open(config.url.clone())?;

        // ConnectionManager reconnects automatically
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");

        Ok(Self {
            _client: client,
            manager,
        })
    }

    pub fn manager(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

/// RENAME reports a missing source as a server-side ERR reply whose detail
/// reads "no such key".
fn rename_source_missing(e: &redis::RedisError) -> bool {
    e.kind() == redis::ErrorKind::ResponseError
        && e.detail().is_some_and(|d| d.contains("no such key"))
}

#[async_trait]
impl CredentialStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.manager.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get key: {}", e))?;
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs())
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to set key: {}", e))?;
        Ok(())
    }

    async fn rename_atomic(&self, old_key: &str, new_key: &str) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        let result: Result<(), redis::RedisError> = redis::cmd("RENAME")
            .arg(old_key)
            .arg(new_key)
            .query_async(&mut conn)
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) if rename_source_missing(&e) => Err(StoreError::SourceMissing),
            Err(e) => Err(StoreError::Backend(anyhow::anyhow!(
                "Failed to rename key: {}",
                e
            ))),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        let _: () = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to delete key: {}", e))?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))?;
        Ok(())
    }
}

/// In-memory store with real TTL semantics, used by tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: std::sync::Mutex<std::collections::HashMap<String, (String, std::time::Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining TTL for a live key. Not part of the store contract.
    pub fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.lock().expect("memory store mutex poisoned");
        let (_, deadline) = entries.get(key)?;
        deadline.checked_duration_since(std::time::Instant::now())
    }

    pub fn len(&self) -> usize {
        let now = std::time::Instant::now();
        self.entries
            .lock()
            .expect("memory store mutex poisoned")
            .values()
            .filter(|(_, deadline)| *deadline > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("memory store mutex poisoned: {}", e))?;
        match entries.get(key) {
            Some((value, deadline)) if *deadline > std::time::Instant::now() => {
                Ok(Some(value.clone()))
            }
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let deadline = std::time::Instant::now() + ttl;
        self.entries
            .lock()
            .map_err(|e| anyhow::anyhow!("memory store mutex poisoned: {}", e))?
            .insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn rename_atomic(&self, old_key: &str, new_key: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("memory store mutex poisoned: {}", e))?;
        match entries.remove(old_key) {
            Some((value, deadline)) if deadline > std::time::Instant::now() => {
                entries.insert(new_key.to_string(), (value, deadline));
                Ok(())
            }
            _ => Err(StoreError::SourceMissing),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .map_err(|e| anyhow::anyhow!("memory store mutex poisoned: {}", e))?
            .remove(key);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
