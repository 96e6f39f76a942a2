//! Byte-oriented store backends.
//!
//! A backend only moves bytes: it knows nothing about envelopes, codecs or
//! retries. The façade layers those on top and races every backend call
//! against the operation's context.

#[cfg(feature = "inmemory")]
mod inmemory;
#[cfg(feature = "redis")]
mod redis;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryBackend;
#[cfg(feature = "redis")]
pub use self::redis::RedisBackend;

use crate::error::Result;
use std::future::Future;
use std::time::Duration;

/// Minimal get/set store contract the cache façade is built on.
///
/// Implementations must be safe for concurrent use. Failures that may go
/// away on their own (network, pool exhaustion) should be reported as
/// `Error::BackendError` so the façade retries them.
pub trait CacheBackend: Send + Sync {
    /// Fetch the bytes stored under `key`.
    ///
    /// `Ok(None)` means the key is absent; it is not an error.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Store `value` under `key`, expiring after `ttl` when given.
    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Remove `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Whether the store answers.
    fn health_check(&self) -> impl Future<Output = Result<bool>> + Send {
        async { Ok(true) }
    }
}

impl<T: CacheBackend> CacheBackend for std::sync::Arc<T> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send {
        (**self).get(key)
    }

    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<()>> + Send {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send {
        (**self).delete(key)
    }

    fn health_check(&self) -> impl Future<Output = Result<bool>> + Send {
        (**self).health_check()
    }
}
