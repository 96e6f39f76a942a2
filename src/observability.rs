//! Hooks for recording cache activity.

use std::time::Duration;

/// Receives cache events from the façade.
///
/// Implement this to feed your metrics system; every method has a no-op
/// default so implementors only override what they track.
pub trait CacheMetrics: Send + Sync {
    /// A read found and decoded a value.
    fn record_hit(&self, _key: &str, _duration: Duration) {}

    /// A read found no value.
    fn record_miss(&self, _key: &str, _duration: Duration) {}

    /// A write stored a value; `compressed` tells which envelope format.
    fn record_write(&self, _key: &str, _compressed: bool, _duration: Duration) {}

    /// A store call failed and is about to be retried.
    fn record_retry(&self, _key: &str, _attempt: u32) {}

    /// An operation ended with an error.
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Metrics sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {}
