//! Typed cache façade - main entry point for cache operations.

use crate::backend::CacheBackend;
use crate::builder::OperationBuilder;
use crate::codec::{Codec, CodecError};
use crate::config::CacheConfig;
use crate::context::OpContext;
use crate::envelope::{Envelope, Format};
use crate::error::{Error, Result};
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::retry::{Outcome, RetryPolicy};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Typed get/set over a byte-oriented backend.
///
/// Values are stored as an [`Envelope`] whose payload is JSON, gzip-compressed
/// when it is larger than `config.gzip_min_size` and compression pays off.
/// Store calls are retried with linear backoff and bounded by an
/// [`OpContext`].
///
/// The façade holds no per-key state and is safe to share between tasks;
/// wrap it in [`CacheService`](crate::CacheService) for cheap cloning.
///
/// # Example
///
/// ```
/// use kit_cache::{backend::InMemoryBackend, ModelCache};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> kit_cache::Result<()> {
/// let cache = ModelCache::new(InMemoryBackend::new());
///
/// cache.set_model("k1", &vec![1, 2, 3], Duration::from_secs(60)).await?;
/// let back: Option<Vec<i32>> = cache.get_model("k1").await?;
/// assert_eq!(back, Some(vec![1, 2, 3]));
/// # Ok(())
/// # }
/// ```
pub struct ModelCache<B: CacheBackend> {
    backend: B,
    config: CacheConfig,
    codec: Arc<Codec>,
    metrics: Box<dyn CacheMetrics>,
}

impl<B: CacheBackend> ModelCache<B> {
    /// Create a cache over `backend` with default configuration.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, CacheConfig::default())
    }

    /// Create a cache over `backend`; unset config values get defaults.
    pub fn with_config(backend: B, config: CacheConfig) -> Self {
        ModelCache {
            backend,
            config: config.normalized(),
            codec: Arc::new(Codec::new()),
            metrics: Box::new(NoOpMetrics),
        }
    }

    /// Use `codec` (and its pools) instead of a private one.
    pub fn with_codec(mut self, codec: Arc<Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get backend reference (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Start an operation with per-call overrides.
    pub fn operation(&self) -> OperationBuilder<'_, B> {
        OperationBuilder::new(self)
    }

    /// Encode `value` and store it under `key` for `ttl` (zero: no expiry).
    ///
    /// See [`OperationBuilder::set_model`] for the error cases.
    pub async fn set_model<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        self.operation().set_model(key, value, ttl).await
    }

    /// Load the value under `key`; `Ok(None)` when absent.
    ///
    /// See [`OperationBuilder::get_model`] for the error cases.
    pub async fn get_model<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.operation().get_model(key).await
    }

    pub async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.operation().get_raw(key).await
    }

    pub async fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.operation().set_raw(key, value, ttl).await
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.operation().delete(key).await
    }

    /// Whether the backend answers, bounded by the configured timeout.
    pub async fn health_check(&self) -> Result<bool> {
        let ctx = self.derive_context(None);
        ctx.run(self.backend.health_check())
            .await
            .unwrap_or(Ok(false))
    }

    /// Child of the caller's context, or a fresh context. Either way the
    /// operation ends no later than the configured timeout.
    pub(crate) fn derive_context(&self, parent: Option<&OpContext>) -> OpContext {
        match parent {
            Some(parent) => parent.child_with_timeout(self.config.timeout()),
            None => OpContext::with_timeout(self.config.timeout()),
        }
    }

    pub(crate) async fn store_model<T: Serialize + ?Sized>(
        &self,
        ctx: &OpContext,
        policy: RetryPolicy,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let timer = Instant::now();
        trace!("[cache: set_model] key={} ttl={:?}", key, ttl);

        let encoded = self
            .codec
            .encode(value, self.config.gzip_min_size)
            .map_err(|e| self.fail(key, codec_error(key, e)))?;

        let format = Format::json(encoded.compressed);
        let payload = Envelope::new(format, encoded.bytes)
            .to_bytes()
            .map_err(|e| {
                self.fail(
                    key,
                    Error::EncodingError {
                        key: key.to_string(),
                        reason: format!("envelope: {}", e),
                    },
                )
            })?;

        let size = payload.len();
        self.write(ctx, policy, key, payload, ttl).await?;

        self.metrics
            .record_write(key, encoded.compressed, timer.elapsed());
        debug!(
            "✓ Cached {} as {} ({} bytes) in {:?}",
            key,
            format,
            size,
            timer.elapsed()
        );
        Ok(())
    }

    pub(crate) async fn load_model<T: DeserializeOwned>(
        &self,
        ctx: &OpContext,
        policy: RetryPolicy,
        key: &str,
    ) -> Result<Option<T>> {
        let timer = Instant::now();
        trace!("[cache: get_model] key={}", key);

        let bytes = match self.read(ctx, policy, key).await? {
            Some(bytes) => bytes,
            None => {
                self.metrics.record_miss(key, timer.elapsed());
                debug!("✗ Cache miss for {}", key);
                return Ok(None);
            }
        };

        let envelope = Envelope::from_bytes(&bytes).map_err(|e| {
            self.fail(
                key,
                Error::DecodeError {
                    key: key.to_string(),
                    reason: e.to_string(),
                },
            )
        })?;

        let compressed = match envelope.format() {
            Some(Format::Json) => false,
            Some(Format::JsonGzip) => true,
            _ => {
                return Err(self.fail(
                    key,
                    Error::InvalidFormat {
                        key: key.to_string(),
                        flag: envelope.flag,
                    },
                ))
            }
        };

        let value = self
            .codec
            .decode(&envelope.data, compressed)
            .map_err(|e| self.fail(key, codec_error(key, e)))?;

        self.metrics.record_hit(key, timer.elapsed());
        debug!("✓ Cache hit for {} in {:?}", key, timer.elapsed());
        Ok(Some(value))
    }

    pub(crate) async fn load_raw(
        &self,
        ctx: &OpContext,
        policy: RetryPolicy,
        key: &str,
    ) -> Result<Option<Vec<u8>>> {
        self.read(ctx, policy, key).await
    }

    pub(crate) async fn store_raw(
        &self,
        ctx: &OpContext,
        policy: RetryPolicy,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<()> {
        self.write(ctx, policy, key, value, ttl).await
    }

    pub(crate) async fn remove(
        &self,
        ctx: &OpContext,
        policy: RetryPolicy,
        key: &str,
    ) -> Result<()> {
        let outcome = policy
            .run(
                ctx,
                key,
                |attempt, _| self.metrics.record_retry(key, attempt),
                |_| self.backend.delete(key),
            )
            .await;
        self.settle(key, outcome, |attempts, source| Error::StoreWriteError {
            key: key.to_string(),
            attempts,
            source,
        })
    }

    /// Retried read of the raw bytes under `key`. Absence is not retried.
    async fn read(
        &self,
        ctx: &OpContext,
        policy: RetryPolicy,
        key: &str,
    ) -> Result<Option<Vec<u8>>> {
        let outcome = policy
            .run(
                ctx,
                key,
                |attempt, _| self.metrics.record_retry(key, attempt),
                |_| self.backend.get(key),
            )
            .await;
        self.settle(key, outcome, |attempts, source| Error::StoreReadError {
            key: key.to_string(),
            attempts,
            source,
        })
    }

    /// Retried write of `payload` under `key`.
    async fn write(
        &self,
        ctx: &OpContext,
        policy: RetryPolicy,
        key: &str,
        payload: Vec<u8>,
        ttl: Duration,
    ) -> Result<()> {
        // zero TTL keeps the entry until evicted
        let ttl = (!ttl.is_zero()).then_some(ttl);
        let outcome = policy
            .run(
                ctx,
                key,
                |attempt, _| self.metrics.record_retry(key, attempt),
                |_| self.backend.set(key, payload.clone(), ttl),
            )
            .await;
        self.settle(key, outcome, |attempts, source| Error::StoreWriteError {
            key: key.to_string(),
            attempts,
            source,
        })
    }

    /// Turn a retry outcome into the caller-facing result. Store failures,
    /// retried or not, are wrapped by `store_error` with the attempt count.
    fn settle<T>(
        &self,
        key: &str,
        outcome: Outcome<T>,
        store_error: impl FnOnce(u32, Box<Error>) -> Error,
    ) -> Result<T> {
        match outcome {
            Outcome::Done(value) => Ok(value),
            Outcome::Exhausted {
                attempts,
                last: error,
            }
            | Outcome::Fatal { attempts, error } => {
                Err(self.fail(key, store_error(attempts, Box::new(error))))
            }
            Outcome::Cancelled(reason) => Err(self.fail(
                key,
                Error::Cancelled {
                    key: key.to_string(),
                    reason,
                },
            )),
        }
    }

    fn fail(&self, key: &str, err: Error) -> Error {
        warn!("✗ Cache operation on {} failed: {}", key, err);
        self.metrics.record_error(key, &err.to_string());
        err
    }
}

fn codec_error(key: &str, err: CodecError) -> Error {
    let key = key.to_string();
    let reason = err.to_string();
    match err {
        CodecError::Encoding(_) | CodecError::Compression(_) => Error::EncodingError { key, reason },
        CodecError::Decompression(_) => Error::DecompressionError { key, reason },
        CodecError::Deserialization(_) => Error::DeserializationError { key, reason },
    }
}
