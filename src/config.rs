//! Cache client configuration.
//!
//! Every option has a default that is applied when the value is unset or
//! not usable (zero where a positive value is required). Configuration can
//! come from serde (YAML/JSON files, keys in snake_case) or from
//! `KIT_CACHE_*` environment variables.

use crate::codec::DEFAULT_GZIP_MIN_SIZE;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:6379";
pub const DEFAULT_POOL_SIZE: usize = 20;
pub const DEFAULT_MAX_IDLE: usize = 15;
/// Seconds.
pub const DEFAULT_DIAL_TIMEOUT: u64 = 5;
/// Seconds.
pub const DEFAULT_TIMEOUT: u64 = 10;

/// Connection and codec settings for the cache.
///
/// # Example
///
/// ```
/// use kit_cache::config::CacheConfig;
/// use std::time::Duration;
///
/// let config = CacheConfig {
///     retry_times: 2,
///     ..Default::default()
/// }
/// .normalized();
///
/// assert_eq!(config.timeout(), Duration::from_secs(10));
/// assert_eq!(config.gzip_min_size, 2048);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// `host:port` of the store.
    pub address: String,
    /// Empty means no authentication.
    pub password: String,
    /// Database index.
    pub db: i64,
    /// Maximum open connections.
    pub pool_size: usize,
    /// Idle connections kept open at most.
    pub max_idle: usize,
    /// Idle connections kept open at least.
    pub min_idle: usize,
    /// Seconds allowed to establish a connection.
    pub dial_timeout: u64,
    /// Seconds allowed for reads and writes; also bounds each façade call
    /// that has no caller-supplied context.
    pub timeout: u64,
    /// Extra attempts after a failed store call.
    pub retry_times: u32,
    /// Serialized size above which payloads are compressed.
    pub gzip_min_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            address: DEFAULT_ADDRESS.to_string(),
            password: String::new(),
            db: 0,
            pool_size: DEFAULT_POOL_SIZE,
            max_idle: DEFAULT_MAX_IDLE,
            min_idle: 0,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
            retry_times: 0,
            gzip_min_size: DEFAULT_GZIP_MIN_SIZE,
        }
    }
}

impl CacheConfig {
    /// Replace unset or unusable values with defaults.
    pub fn normalized(mut self) -> Self {
        if self.address.trim().is_empty() {
            self.address = DEFAULT_ADDRESS.to_string();
        }
        if self.pool_size == 0 {
            self.pool_size = DEFAULT_POOL_SIZE;
        }
        if self.dial_timeout == 0 {
            self.dial_timeout = DEFAULT_DIAL_TIMEOUT;
        }
        if self.timeout == 0 {
            self.timeout = DEFAULT_TIMEOUT;
        }
        if self.max_idle == 0 {
            self.max_idle = DEFAULT_MAX_IDLE;
        }
        if self.min_idle > self.max_idle {
            debug!(
                "min_idle {} exceeds max_idle {}, clamping",
                self.min_idle, self.max_idle
            );
            self.min_idle = self.max_idle;
        }
        if self.gzip_min_size == 0 {
            self.gzip_min_size = DEFAULT_GZIP_MIN_SIZE;
        }
        self
    }

    /// Build from `KIT_CACHE_*` environment variables on top of defaults.
    ///
    /// Recognized: `KIT_CACHE_ADDRESS`, `KIT_CACHE_PASSWORD`, `KIT_CACHE_DB`,
    /// `KIT_CACHE_POOL_SIZE`, `KIT_CACHE_MAX_IDLE`, `KIT_CACHE_MIN_IDLE`,
    /// `KIT_CACHE_DIAL_TIMEOUT`, `KIT_CACHE_TIMEOUT`, `KIT_CACHE_RETRY_TIMES`,
    /// `KIT_CACHE_GZIP_MIN_SIZE`.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` when a variable is set but does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = CacheConfig::default();

        if let Some(address) = lookup("KIT_CACHE_ADDRESS") {
            config.address = address;
        }
        if let Some(password) = lookup("KIT_CACHE_PASSWORD") {
            config.password = password;
        }
        parse_into(&lookup, "KIT_CACHE_DB", &mut config.db)?;
        parse_into(&lookup, "KIT_CACHE_POOL_SIZE", &mut config.pool_size)?;
        parse_into(&lookup, "KIT_CACHE_MAX_IDLE", &mut config.max_idle)?;
        parse_into(&lookup, "KIT_CACHE_MIN_IDLE", &mut config.min_idle)?;
        parse_into(&lookup, "KIT_CACHE_DIAL_TIMEOUT", &mut config.dial_timeout)?;
        parse_into(&lookup, "KIT_CACHE_TIMEOUT", &mut config.timeout)?;
        parse_into(&lookup, "KIT_CACHE_RETRY_TIMES", &mut config.retry_times)?;
        parse_into(&lookup, "KIT_CACHE_GZIP_MIN_SIZE", &mut config.gzip_min_size)?;

        Ok(config.normalized())
    }

    pub fn dial_timeout(&self) -> Duration {
        Duration::from_secs(self.dial_timeout)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Connection URL in the `redis://` scheme.
    pub fn url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}/{}", self.address, self.db)
        } else {
            format!("redis://:{}@{}/{}", self.password, self.address, self.db)
        }
    }
}

fn parse_into<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    slot: &mut T,
) -> Result<()>
where
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(name) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|e| Error::ConfigError(format!("{}={:?}: {}", name, raw, e)))?;
    }
    Ok(())
}
