//! The record persisted as a cache value.
//!
//! # Format
//!
//! ```text
//! {"Flag": <u32>, "Data": "<base64>"}
//! ```
//!
//! `Flag` names how `Data` is encoded; `Data` is standard base64 (with
//! padding), the same representation Go's `encoding/json` uses for byte
//! slices, so entries written by either side read back on the other.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Encoding of an envelope's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Format {
    /// Reserved: opaque binary payload.
    Raw = 0,
    /// Reserved: gzip-compressed binary payload.
    RawGzip = 1,
    Json = 10,
    JsonGzip = 11,
}

impl Format {
    pub fn from_flag(flag: u32) -> Option<Format> {
        match flag {
            0 => Some(Format::Raw),
            1 => Some(Format::RawGzip),
            10 => Some(Format::Json),
            11 => Some(Format::JsonGzip),
            _ => None,
        }
    }

    pub fn flag(self) -> u32 {
        self as u32
    }

    pub fn is_compressed(self) -> bool {
        matches!(self, Format::RawGzip | Format::JsonGzip)
    }

    /// JSON format matching the codec's compression decision.
    pub fn json(compressed: bool) -> Format {
        if compressed {
            Format::JsonGzip
        } else {
            Format::Json
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Raw => "raw",
            Format::RawGzip => "raw+gzip",
            Format::Json => "json",
            Format::JsonGzip => "json+gzip",
        };
        write!(f, "{}", name)
    }
}

/// Tagged payload stored under a cache key.
///
/// The flag is kept as a bare integer so that unknown tags survive parsing
/// and can be reported as corruption by the reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "Flag")]
    pub flag: u32,
    #[serde(rename = "Data", with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl Envelope {
    pub fn new(format: Format, data: Vec<u8>) -> Self {
        Envelope {
            flag: format.flag(),
            data,
        }
    }

    /// Known format of the payload, `None` for unrecognized flags.
    pub fn format(&self) -> Option<Format> {
        Format::from_flag(self.flag)
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        // Go encodes a nil slice as null.
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        match encoded {
            Some(s) => STANDARD.decode(s).map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}
