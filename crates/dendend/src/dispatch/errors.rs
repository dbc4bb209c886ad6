//! Error types for frame handling on a dispatch connection.
//!
//! None of these reach the dispatch engine: they describe calls that could
//! not be read or decoded, and are reported to the client as `fault` frames.

use std::io;

use thiserror::Error;

/// Errors surfaced while reading, decoding, or answering a call frame.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Call line could not be decoded into an `RpcCall`.
    #[error("malformed JSONL: {message}")]
    MalformedJsonl {
        /// Decoder diagnostic.
        message: String,
        /// Underlying decoder error, when there was one.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Call exceeds the maximum allowed size.
    #[error("request too large: {size} bytes exceeds {max_size} byte limit")]
    RequestTooLarge {
        /// Bytes read before giving up.
        size: usize,
        /// Configured limit.
        max_size: usize,
    },

    /// IO error during read or write.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Reply serialisation failed.
    #[error("failed to serialize reply: {0}")]
    SerializeReply(#[source] serde_json::Error),
}

impl DispatchError {
    /// Creates a malformed JSONL error from a serde error.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::MalformedJsonl {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed JSONL error with a custom message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedJsonl {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a request too large error.
    pub const fn request_too_large(size: usize, max_size: usize) -> Self {
        Self::RequestTooLarge { size, max_size }
    }
}
