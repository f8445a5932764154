use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Codec;
use crate::error::{StorageError, StorageResult};

/// JSON codec backed by `serde_json`.
///
/// Floats are written in their shortest round-trip form and parsed with
/// `float_roundtrip`, so `decode(encode(x)) == x` for every finite `f64`.
/// Non-finite floats serialize as `null` and therefore fail to decode as a
/// number.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> StorageResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|err| StorageError::Encoding(err.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> StorageResult<T> {
        serde_json::from_slice(bytes).map_err(|err| StorageError::Decoding(err.to_string()))
    }
}
