//! services/api/src/adapters/cache.rs
//!
//! Redis implementation of the `CacheService` port.
//!
//! The connection is opened on first use, so the API can boot and serve from
//! Postgres while Redis is still down. Until a connection succeeds every cache
//! call fails with `PortError::Unexpected`, which the cache-aside helper treats
//! as a miss.

use async_trait::async_trait;
use bookshelf_core::ports::{CacheService, PortError, PortResult};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ConnectionInfo};
use std::time::Duration;
use tokio::sync::OnceCell;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// A cache adapter backed by a lazily opened, auto-reconnecting Redis connection.
pub struct RedisCache {
    client: Client,
    conn: OnceCell<ConnectionManager>,
}

impl RedisCache {
    /// Validates the connection settings without touching the network.
    pub fn open(info: ConnectionInfo) -> Result<Self, redis::RedisError> {
        Ok(Self {
            client: Client::open(info)?,
            conn: OnceCell::new(),
        })
    }

    /// Returns the shared connection, opening it if no attempt has succeeded yet.
    async fn connection(&self) -> PortResult<ConnectionManager> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                match tokio::time::timeout(
                    CONNECT_TIMEOUT,
                    ConnectionManager::new(self.client.clone()),
                )
                .await
                {
                    Ok(Ok(conn)) => {
                        tracing::info!("Redis connection established.");
                        Ok(conn)
                    }
                    Ok(Err(e)) => Err(PortError::Unexpected(format!("Redis connect: {}", e))),
                    Err(_) => Err(PortError::Unexpected(
                        "Redis connect: timed out".to_string(),
                    )),
                }
            })
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| PortError::Unexpected(format!("Redis GET {}: {}", key, e)))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> PortResult<()> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
            .map_err(|e| PortError::Unexpected(format!("Redis SET {}: {}", key, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::{cached, CACHE_TTL};
    use redis::{ConnectionAddr, RedisConnectionInfo};

    fn unreachable() -> RedisCache {
        RedisCache::open(ConnectionInfo {
            addr: ConnectionAddr::Tcp("127.0.0.1".to_string(), 1),
            redis: RedisConnectionInfo::default(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn unreachable_server_is_reported_per_call() {
        let cache = unreachable();
        assert!(matches!(cache.get("books:1").await, Err(PortError::Unexpected(_))));
        assert!(matches!(
            cache.set("books:1", "{}", CACHE_TTL).await,
            Err(PortError::Unexpected(_))
        ));
        // A failed attempt leaves the cell empty so the next call retries.
        assert!(cache.conn.get().is_none());
    }

    #[tokio::test]
    async fn reads_fall_through_while_redis_is_down() {
        let cache = unreachable();
        let value: Vec<i64> = cached(&cache, "books:list", || async { Ok(vec![1, 2, 3]) })
            .await
            .unwrap();
        assert_eq!(value, vec![1, 2, 3]);
    }
}
