//! Shareable handle to a [`ModelCache`].

use crate::backend::CacheBackend;
use crate::client::ModelCache;
use std::ops::Deref;
use std::sync::Arc;

/// Cheaply cloneable wrapper around `Arc<ModelCache<B>>`.
///
/// Hand one clone to each task or request handler; all clones share the
/// same backend, codec pools and metrics hook.
///
/// # Example
///
/// ```
/// use kit_cache::{backend::InMemoryBackend, CacheService};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> kit_cache::Result<()> {
/// let cache = CacheService::new(InMemoryBackend::new());
/// let handle = cache.clone();
///
/// tokio::spawn(async move {
///     handle.set_model("k", &42u32, Duration::from_secs(60)).await
/// })
/// .await
/// .expect("task panicked")?;
///
/// assert_eq!(cache.get_model::<u32>("k").await?, Some(42));
/// # Ok(())
/// # }
/// ```
pub struct CacheService<B: CacheBackend> {
    cache: Arc<ModelCache<B>>,
}

impl<B: CacheBackend> CacheService<B> {
    pub fn new(backend: B) -> Self {
        Self::from_cache(ModelCache::new(backend))
    }

    /// Wrap an already configured cache.
    pub fn from_cache(cache: ModelCache<B>) -> Self {
        CacheService {
            cache: Arc::new(cache),
        }
    }

    pub fn cache(&self) -> &Arc<ModelCache<B>> {
        &self.cache
    }
}

impl<B: CacheBackend> Clone for CacheService<B> {
    fn clone(&self) -> Self {
        CacheService {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<B: CacheBackend> Deref for CacheService<B> {
    type Target = ModelCache<B>;

    fn deref(&self) -> &Self::Target {
        &self.cache
    }
}
