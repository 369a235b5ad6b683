//! Payload codec
//!
//! Turns document payloads into the bytes stored in the `data` column and back.
//! Codec failures surface as [`StoreError::Serialization`] so they travel through
//! the same error taxonomy as backend failures.

use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Encodes and decodes document payloads
pub trait PayloadCodec: Send + Sync {
    fn encode(&self, value: &Value) -> StoreResult<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> StoreResult<Value>;
}

/// JSON payload codec (UTF-8 `serde_json`)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn encode(&self, value: &Value) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> StoreResult<Value> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}
