use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Codec;
use crate::error::{StorageError, StorageResult};

/// Compact binary codec backed by `ciborium`.
///
/// Unlike [`super::JsonCodec`], CBOR represents non-finite floats and maps
/// with non-string keys, and stores byte strings without base64 inflation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

impl Codec for CborCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> StorageResult<Vec<u8>> {
        let mut out = Vec::new();
        ciborium::into_writer(value, &mut out)
            .map_err(|err| StorageError::Encoding(err.to_string()))?;
        Ok(out)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> StorageResult<T> {
        ciborium::from_reader(bytes).map_err(|err| StorageError::Decoding(err.to_string()))
    }
}
