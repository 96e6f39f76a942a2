//! Builder for cache operations with per-call overrides.

use crate::backend::CacheBackend;
use crate::client::ModelCache;
use crate::context::OpContext;
use crate::error::Result;
use crate::retry::RetryPolicy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Fluent builder for a single cache operation.
///
/// Lets a caller bind the operation to its own [`OpContext`] and override
/// the retry count configured on the cache.
///
/// # Example
///
/// ```ignore
/// use kit_cache::context::OpContext;
/// use std::time::Duration;
///
/// let ctx = OpContext::with_timeout(Duration::from_millis(500));
/// cache
///     .operation()
///     .with_context(&ctx)
///     .with_retry(3)
///     .set_model("user:1", &user, Duration::from_secs(60))
///     .await?;
/// ```
pub struct OperationBuilder<'a, B: CacheBackend> {
    cache: &'a ModelCache<B>,
    context: Option<OpContext>,
    retry_count: Option<u32>,
}

impl<'a, B: CacheBackend> OperationBuilder<'a, B> {
    pub(crate) fn new(cache: &'a ModelCache<B>) -> Self {
        Self {
            cache,
            context: None,
            retry_count: None,
        }
    }

    /// Run the operation under a child of `ctx`.
    ///
    /// Cancelling `ctx` (or reaching its deadline) aborts the operation,
    /// including any pending retry. The cache's configured timeout still
    /// applies when it is the earlier bound.
    pub fn with_context(mut self, ctx: &OpContext) -> Self {
        self.context = Some(ctx.clone());
        self
    }

    /// Override how many times a failed store call is retried.
    ///
    /// # Example
    ///
    /// ```ignore
    /// cache.operation().with_retry(3)  // up to 4 attempts
    /// ```
    pub fn with_retry(mut self, count: u32) -> Self {
        self.retry_count = Some(count);
        self
    }

    fn prepare(&self) -> (OpContext, RetryPolicy) {
        let ctx = self.cache.derive_context(self.context.as_ref());
        let policy = RetryPolicy::new(
            self.retry_count
                .unwrap_or(self.cache.config().retry_times),
        );
        (ctx, policy)
    }

    /// Encode `value` and store it under `key`.
    ///
    /// A zero `ttl` stores the entry without expiry.
    ///
    /// # Errors
    ///
    /// - `Error::EncodingError`: value cannot be serialized
    /// - `Error::StoreWriteError`: every attempt failed
    /// - `Error::Cancelled`: the context ended before a write succeeded
    pub async fn set_model<T: Serialize + ?Sized>(
        self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let (ctx, policy) = self.prepare();
        self.cache.store_model(&ctx, policy, key, value, ttl).await
    }

    /// Load and decode the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// - `Error::StoreReadError`: every attempt failed
    /// - `Error::Cancelled`: the context ended before a read succeeded
    /// - `Error::DecodeError`: stored bytes are not an envelope
    /// - `Error::InvalidFormat`: envelope flag is not readable
    /// - `Error::DecompressionError` / `Error::DeserializationError`: payload is corrupt
    ///   or does not match `T`
    pub async fn get_model<T: DeserializeOwned>(self, key: &str) -> Result<Option<T>> {
        let (ctx, policy) = self.prepare();
        self.cache.load_model(&ctx, policy, key).await
    }

    /// Read the bytes under `key` as stored, without envelope decoding.
    pub async fn get_raw(self, key: &str) -> Result<Option<Vec<u8>>> {
        let (ctx, policy) = self.prepare();
        self.cache.load_raw(&ctx, policy, key).await
    }

    /// Store `value` under `key` as is, without envelope encoding.
    pub async fn set_raw(self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let (ctx, policy) = self.prepare();
        self.cache.store_raw(&ctx, policy, key, value, ttl).await
    }

    /// Remove `key` from the store.
    pub async fn delete(self, key: &str) -> Result<()> {
        let (ctx, policy) = self.prepare();
        self.cache.remove(&ctx, policy, key).await
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::{CacheBackend, InMemoryBackend};
    use crate::client::ModelCache;
    use crate::config::CacheConfig;
    use crate::context::OpContext;
    use crate::error::{Error, Result};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Backend whose writes always fail.
    #[derive(Default)]
    struct DownBackend {
        calls: AtomicU32,
    }

    impl CacheBackend for DownBackend {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::BackendError("down".to_string()))
        }

        async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Option<Duration>) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::BackendError("down".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::BackendError("down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_builder_basic() {
        let cache = ModelCache::new(InMemoryBackend::new());

        cache
            .operation()
            .set_model("user:1", &"alice", Duration::from_secs(60))
            .await
            .expect("Failed to set");

        let value: Option<String> = cache
            .operation()
            .get_model("user:1")
            .await
            .expect("Failed to get");
        assert_eq!(value.as_deref(), Some("alice"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_builder_retry_overrides_config() {
        let backend = Arc::new(DownBackend::default());
        let cache = ModelCache::with_config(
            Arc::clone(&backend),
            CacheConfig {
                retry_times: 1,
                ..Default::default()
            },
        );

        let err = cache
            .operation()
            .with_retry(4)
            .set_model("k", &1, Duration::from_secs(1))
            .await
            .expect_err("should fail");

        assert!(matches!(err, Error::StoreWriteError { attempts: 5, .. }));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 5);

        backend.calls.store(0, Ordering::SeqCst);
        let _ = cache.delete("k").await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_builder_context_deadline_applies() {
        let backend = Arc::new(DownBackend::default());
        let cache = ModelCache::new(Arc::clone(&backend));
        let ctx = OpContext::with_timeout(Duration::from_millis(250));

        let err = cache
            .operation()
            .with_context(&ctx)
            .with_retry(10)
            .get_raw("k")
            .await
            .expect_err("should time out");

        assert!(err.is_cancelled());
        // attempts at 0ms and 100ms; deadline hits during the 200ms wait
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }
}
