//! Size-adaptive JSON + gzip codec.
//!
//! Values are serialized to JSON. Payloads larger than the caller's
//! threshold are gzip-compressed at the fastest level, and the compressed
//! form is kept only when it is strictly smaller than the JSON.
//!
//! Scratch buffers and deflate state come from pools owned by the [`Codec`]
//! instance; nothing here is process-global.

pub mod pool;

use flate2::read::GzDecoder;
use flate2::{Crc, FlushCompress, Status};
use pool::{buffer_pool, compressor_pool, BufferPool, CompressorPool, DEFAULT_MAX_IDLE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, Read};
use thiserror::Error;

/// Default compression threshold in serialized bytes.
pub const DEFAULT_GZIP_MIN_SIZE: usize = 2048;

// ID1 ID2 CM=deflate FLG=0 MTIME=0 XFL=4 (fastest) OS=255 (unknown)
const GZIP_HEADER: [u8; 10] = [0x1f, 0x8b, 0x08, 0x00, 0, 0, 0, 0, 0x04, 0xff];
const GZIP_TRAILER_LEN: usize = 8;

/// Codec failures, without cache-key context.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("serialize: {0}")]
    Encoding(#[source] serde_json::Error),

    #[error("compress: {0}")]
    Compression(#[source] io::Error),

    #[error("decompress: {0}")]
    Decompression(#[source] io::Error),

    #[error("deserialize: {0}")]
    Deserialization(#[source] serde_json::Error),
}

/// Output of [`Codec::encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    /// Whether `bytes` is gzip data.
    pub compressed: bool,
    pub bytes: Vec<u8>,
}

/// JSON/gzip codec with pooled scratch space.
///
/// Safe to share between tasks; every call takes its own buffer and
/// compressor from the pools and returns them before finishing.
#[derive(Debug)]
pub struct Codec {
    buffers: BufferPool,
    compressors: CompressorPool,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec {
    pub fn new() -> Self {
        Self::with_max_idle(DEFAULT_MAX_IDLE)
    }

    /// Codec whose pools keep at most `max_idle` objects each.
    pub fn with_max_idle(max_idle: usize) -> Self {
        Codec {
            buffers: buffer_pool(max_idle),
            compressors: compressor_pool(max_idle),
        }
    }

    /// Serialize `value`, compressing when the JSON is longer than
    /// `min_size` bytes and compression actually shrinks it.
    pub fn encode<T: Serialize + ?Sized>(
        &self,
        value: &T,
        min_size: usize,
    ) -> Result<Encoded, CodecError> {
        let json = serde_json::to_vec(value).map_err(CodecError::Encoding)?;

        if json.len() <= min_size {
            return Ok(Encoded {
                compressed: false,
                bytes: json,
            });
        }

        let mut buf = self.buffers.acquire();
        self.gzip_into(&json, &mut buf)?;

        if buf.len() >= json.len() {
            trace!(
                "gzip did not shrink payload ({} -> {} bytes), storing plain",
                json.len(),
                buf.len()
            );
            return Ok(Encoded {
                compressed: false,
                bytes: json,
            });
        }

        Ok(Encoded {
            compressed: true,
            bytes: buf.to_vec(),
        })
    }

    /// Inverse of [`Codec::encode`].
    pub fn decode<T: DeserializeOwned>(
        &self,
        bytes: &[u8],
        compressed: bool,
    ) -> Result<T, CodecError> {
        if !compressed {
            return serde_json::from_slice(bytes).map_err(CodecError::Deserialization);
        }

        let mut buf = self.buffers.acquire();
        buf.reserve(bytes.len().saturating_mul(3));
        GzDecoder::new(bytes)
            .read_to_end(&mut buf)
            .map_err(CodecError::Decompression)?;

        serde_json::from_slice(&buf).map_err(CodecError::Deserialization)
    }

    /// Write a complete gzip member for `input` into `out`.
    fn gzip_into(&self, input: &[u8], out: &mut Vec<u8>) -> Result<(), CodecError> {
        let mut compressor = self.compressors.acquire();

        out.reserve(GZIP_HEADER.len() + input.len() / 2 + GZIP_TRAILER_LEN);
        out.extend_from_slice(&GZIP_HEADER);

        loop {
            let consumed = compressor.total_in() as usize;
            out.reserve((input.len() - consumed) / 2 + 64);

            let status = compressor
                .compress_vec(&input[consumed..], out, FlushCompress::Finish)
                .map_err(|e| CodecError::Compression(io::Error::other(e)))?;

            if status == Status::StreamEnd {
                break;
            }
        }

        let mut crc = Crc::new();
        crc.update(input);
        out.extend_from_slice(&crc.sum().to_le_bytes());
        // ISIZE is the input length modulo 2^32
        out.extend_from_slice(&(input.len() as u32).to_le_bytes());
        Ok(())
    }
}
