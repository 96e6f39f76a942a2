//! Redis backend built on a `deadpool-redis` connection pool.

use super::CacheBackend;
use crate::config::CacheConfig;
use crate::error::{Error, Result};
use deadpool_redis::{Config, Pool, PoolConfig, Runtime, Timeouts};
use std::time::Duration;

/// Redis backend with connection pooling and async operations.
///
/// # Example
///
/// ```no_run
/// # use kit_cache::backend::{CacheBackend, RedisBackend};
/// # use kit_cache::config::CacheConfig;
/// # use kit_cache::error::Result;
/// # async fn example() -> Result<()> {
/// let config = CacheConfig {
///     address: "localhost:6379".to_string(),
///     ..Default::default()
/// };
///
/// let backend = RedisBackend::connect(&config).await?;
/// backend.set("key", b"value".to_vec(), None).await?;
/// let value = backend.get("key").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisBackend {
    pool: Pool,
}

impl RedisBackend {
    /// Build the pool and verify the server answers `PING`.
    ///
    /// Pool size, dial timeout and read/write timeout come from `config`
    /// (after defaults are applied). The pool keeps up to `pool_size` idle
    /// connections and opens them lazily, so `min_idle`/`max_idle` have no
    /// separate effect here.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if the pool cannot be built and
    /// `Error::BackendError` if the server does not answer.
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        let backend = Self::new(config)?;
        let timeout = config.clone().normalized().timeout();

        match tokio::time::timeout(timeout, backend.ping()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(Error::BackendError(format!(
                    "Redis PING to {} timed out after {:?}",
                    config.address, timeout
                )))
            }
        }

        info!(
            "✓ Redis backend connected to {} (db: {}, pool size: {})",
            config.address, config.db, config.pool_size
        );
        Ok(backend)
    }

    /// Build the pool without contacting the server.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if the pool cannot be built.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let config = config.clone().normalized();

        let mut pool_config = PoolConfig::new(config.pool_size);
        pool_config.timeouts = Timeouts {
            wait: Some(config.timeout()),
            create: Some(config.dial_timeout()),
            recycle: Some(config.timeout()),
        };

        let mut redis_config = Config::from_url(config.url());
        redis_config.pool = Some(pool_config);

        let pool = redis_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::ConfigError(format!("Failed to create Redis pool: {}", e)))?;

        debug!(
            "Redis pool for {} built (size: {}, min_idle: {}, max_idle: {})",
            config.address, config.pool_size, config.min_idle, config.max_idle
        );
        Ok(RedisBackend { pool })
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| Error::BackendError(format!("Failed to get Redis connection: {}", e)))
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        deadpool_redis::redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis PING failed: {}", e)))?;
        Ok(())
    }
}

impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;

        let value = deadpool_redis::redis::cmd("GET")
            .arg(key)
            .query_async::<Option<Vec<u8>>>(&mut conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis GET failed for key {}: {}", key, e)))?;

        match &value {
            Some(_) => debug!("✓ Redis GET {} -> HIT", key),
            None => debug!("✓ Redis GET {} -> MISS", key),
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.connection().await?;

        let mut cmd = deadpool_redis::redis::cmd("SET");
        cmd.arg(key).arg(value.as_slice());
        if let Some(ttl) = ttl {
            // PX needs a positive value
            let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
            cmd.arg("PX").arg(millis);
        }

        cmd.query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis SET failed for key {}: {}", key, e)))?;

        debug!("✓ Redis SET {} (TTL: {:?})", key, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;

        deadpool_redis::redis::cmd("DEL")
            .arg(key)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| {
                Error::BackendError(format!("Redis DEL failed for key {}: {}", key, e))
            })?;

        debug!("✓ Redis DELETE {}", key);
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.ping().await.is_ok())
    }
}
