//! Value codecs.
//!
//! A [`Codec`] turns any `serde` value into the byte sequence stored by a
//! backend and back. The facade is generic over its codec, so an application
//! can move to a different encoding without touching routing.
//!
//! Decoding never coerces between unrelated shapes: bytes written for an
//! integer do not decode as a boolean.

mod cbor;
mod json;

pub use cbor::CborCodec;
pub use json::JsonCodec;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageResult;

/// Encode/decode pair converting structured values to and from bytes.
pub trait Codec: Send + Sync {
    /// Encodes `value` into bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::Encoding`] if the value cannot be
    /// represented (for example a map with non-string keys under JSON).
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> StorageResult<Vec<u8>>;

    /// Decodes `bytes` into a value of shape `T`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::Decoding`] if the bytes are malformed or
    /// describe a different shape.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> StorageResult<T>;
}
