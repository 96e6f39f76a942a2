//! Error types for cache operations.

use crate::context::ContextError;
use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the codec, the backends and the cache façade.
///
/// Every variant produced by the façade carries the cache key, so a caller
/// can tell which phase (encode, store, decode) failed and for which entry.
#[derive(Debug, Error)]
pub enum Error {
    /// Value could not be serialized or compressed on write.
    #[error("encoding failed for key {key}: {reason}")]
    EncodingError { key: String, reason: String },

    /// Stored bytes are not a well-formed envelope.
    #[error("malformed cache envelope for key {key}: {reason}")]
    DecodeError { key: String, reason: String },

    /// Envelope claimed gzip data but the stream is corrupt.
    #[error("decompression failed for key {key}: {reason}")]
    DecompressionError { key: String, reason: String },

    /// Payload does not match the requested type.
    #[error("deserialization failed for key {key}: {reason}")]
    DeserializationError { key: String, reason: String },

    /// Envelope flag outside the set the reader understands.
    #[error("invalid cache format for key {key}: flag={flag}")]
    InvalidFormat { key: String, flag: u32 },

    /// Writes kept failing until the retry budget ran out.
    #[error("cache write failed for key {key} after {attempts} attempt(s): {source}")]
    StoreWriteError {
        key: String,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    /// Reads kept failing until the retry budget ran out.
    #[error("cache read failed for key {key} after {attempts} attempt(s): {source}")]
    StoreReadError {
        key: String,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    /// Operation context was cancelled or its deadline passed.
    #[error("cache operation on key {key} cancelled: {reason}")]
    Cancelled { key: String, reason: ContextError },

    /// Backend (network, pool, protocol) failure.
    #[error("backend error: {0}")]
    BackendError(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Whether the failure is transient and worth another attempt.
    ///
    /// Only raw backend failures qualify; codec and format errors are
    /// data problems that a retry cannot fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::BackendError(_))
    }

    /// Whether the operation ended because its context was done.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }

    /// Key the failed operation targeted, when the error is tied to one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Error::EncodingError { key, .. }
            | Error::DecodeError { key, .. }
            | Error::DecompressionError { key, .. }
            | Error::DeserializationError { key, .. }
            | Error::InvalidFormat { key, .. }
            | Error::StoreWriteError { key, .. }
            | Error::StoreReadError { key, .. }
            | Error::Cancelled { key, .. } => Some(key),
            Error::BackendError(_) | Error::ConfigError(_) => None,
        }
    }
}
