//! Reusable scratch objects for the codec.
//!
//! A [`Pool`] hands out [`Pooled`] guards. Dropping a guard resets the object
//! and puts it back, so release happens on every exit path and the next
//! caller always sees a clean object.

use flate2::{Compress, Compression};
use parking_lot::Mutex;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Idle objects a pool keeps by default.
pub const DEFAULT_MAX_IDLE: usize = 64;

/// Buffers that grew past this are dropped instead of pooled.
pub const MAX_RETAINED_BUFFER: usize = 1 << 20;

/// An object that can be cleared for reuse.
pub trait Reusable {
    /// Clear all state so the object looks freshly constructed.
    fn reset(&mut self);

    /// Whether the object is still worth keeping after use.
    fn retain(&self) -> bool {
        true
    }
}

impl Reusable for Vec<u8> {
    fn reset(&mut self) {
        self.clear();
    }

    fn retain(&self) -> bool {
        self.capacity() <= MAX_RETAINED_BUFFER
    }
}

impl Reusable for Compress {
    fn reset(&mut self) {
        Compress::reset(self);
    }
}

/// Bounded free-list of reusable objects.
pub struct Pool<T: Reusable> {
    idle: Mutex<Vec<T>>,
    max_idle: usize,
    make: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T: Reusable> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("idle", &self.idle.lock().len())
            .field("max_idle", &self.max_idle)
            .finish()
    }
}

impl<T: Reusable> Pool<T> {
    pub fn new(max_idle: usize, make: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Pool {
            idle: Mutex::new(Vec::new()),
            max_idle,
            make: Box::new(make),
        }
    }

    /// Take an idle object or build a new one.
    pub fn acquire(&self) -> Pooled<'_, T> {
        let item = self.idle.lock().pop().unwrap_or_else(|| (self.make)());
        Pooled {
            pool: self,
            item: Some(item),
        }
    }

    /// Number of objects currently waiting for reuse.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    fn release(&self, mut item: T) {
        item.reset();
        if !item.retain() {
            return;
        }
        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(item);
        }
    }
}

/// Pool of byte buffers.
pub type BufferPool = Pool<Vec<u8>>;

/// Pool of raw deflate compressors tuned for speed.
pub type CompressorPool = Pool<Compress>;

pub fn buffer_pool(max_idle: usize) -> BufferPool {
    Pool::new(max_idle, Vec::new)
}

pub fn compressor_pool(max_idle: usize) -> CompressorPool {
    // Raw deflate; the codec writes the gzip framing itself.
    Pool::new(max_idle, || Compress::new(Compression::fast(), false))
}

/// Exclusive handle to a pooled object; returns it to the pool on drop.
pub struct Pooled<'a, T: Reusable> {
    pool: &'a Pool<T>,
    item: Option<T>,
}

impl<T: Reusable> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.item {
            Some(item) => item,
            None => unreachable!("pooled object used after release"),
        }
    }
}

impl<T: Reusable> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.item {
            Some(item) => item,
            None => unreachable!("pooled object used after release"),
        }
    }
}

impl<T: Reusable> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.release(item);
        }
    }
}
