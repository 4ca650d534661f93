//! Body codec injected into the servlet.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Errors from encoding or decoding a body.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode body: {0}")]
    Encode(String),

    #[error("failed to decode body: {0}")]
    Decode(String),
}

/// Converts resources to and from request/response bodies.
pub trait Codec: Send + Sync {
    /// Media type of encoded bodies.
    fn content_type(&self) -> &'static str;

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CodecError>;

    fn decode<T: DeserializeOwned>(&self, body: &str) -> Result<T, CodecError>;
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CodecError> {
        serde_json::to_string(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, body: &str) -> Result<T, CodecError> {
        serde_json::from_str(body).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
