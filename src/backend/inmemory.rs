//! In-memory backend with per-entry expiry.

use super::CacheBackend;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Writes between sweeps of expired entries.
const SWEEP_INTERVAL: usize = 256;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Process-local backend backed by a concurrent map.
///
/// Cloning shares the underlying storage. Expired entries are dropped
/// when read, and swept from the whole map every few hundred writes.
///
/// # Example
///
/// ```
/// use kit_cache::backend::{CacheBackend, InMemoryBackend};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> kit_cache::Result<()> {
/// let backend = InMemoryBackend::new();
/// backend.set("greeting", b"hello".to_vec(), None).await?;
/// assert_eq!(backend.get("greeting").await?, Some(b"hello".to_vec()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    entries: Arc<DashMap<String, Entry>>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry now; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!("InMemory swept {} expired entries", removed);
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
        warn!("⚠ In-memory cache cleared");
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        match self.entries.get(key) {
            None => {
                trace!("InMemory GET {} -> MISS", key);
                return Ok(None);
            }
            Some(entry) if !entry.is_expired(now) => {
                trace!("InMemory GET {} -> HIT", key);
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => {}
        }

        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        trace!("InMemory GET {} -> EXPIRED", key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            self.purge_expired();
        }

        let expires_at = ttl.map(|d| Instant::now() + d);
        self.entries
            .insert(key.to_string(), Entry { value, expires_at });
        trace!("InMemory SET {} (TTL: {:?})", key, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        trace!("InMemory DELETE {}", key);
        Ok(())
    }
}
