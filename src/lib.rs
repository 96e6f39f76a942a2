//! # kit-cache
//!
//! Typed cache façade over a byte-oriented key-value store.
//!
//! ## Features
//!
//! - **Self-describing entries:** every value is stored as a `{Flag, Data}`
//!   envelope, so readers know how to decode it
//! - **Adaptive compression:** JSON payloads above a size threshold are
//!   gzipped, but only when that actually makes them smaller
//! - **Pooled resources:** scratch buffers and compressor state are reused
//! - **Bounded retry:** store round-trips retry with linear backoff
//! - **Cancellation:** every operation runs under an [`OpContext`] with an
//!   optional deadline
//! - **Backend Agnostic:** in-memory and Redis backends, or bring your own
//!
//! ## Quick Start
//!
//! ```
//! use kit_cache::{backend::InMemoryBackend, ModelCache};
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> kit_cache::Result<()> {
//! let cache = ModelCache::new(InMemoryBackend::new());
//!
//! let user = User { id: 1, name: "alice".to_string() };
//! cache.set_model("user:1", &user, Duration::from_secs(300)).await?;
//!
//! let cached: Option<User> = cache.get_model("user:1").await?;
//! assert_eq!(cached, Some(user));
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod builder;
pub mod client;
pub mod codec;
pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod observability;
pub mod retry;
pub mod service;

// Re-exports for convenience
pub use backend::CacheBackend;
pub use builder::OperationBuilder;
pub use client::ModelCache;
pub use codec::Codec;
pub use config::CacheConfig;
pub use context::{ContextError, OpContext};
pub use envelope::{Envelope, Format};
pub use error::{Error, Result};
pub use observability::{CacheMetrics, NoOpMetrics};
pub use retry::RetryPolicy;
pub use service::CacheService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
