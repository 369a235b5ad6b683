//! Row key and cell encoding
//!
//! `encode_key` / `decode_id` and the fixed-width timestamp cell.

use thiserror::Error;

use crate::error::{StoreError, StoreResult};

/// Separator between the document id and the table namespace in a row key
pub const KEY_SEPARATOR: char = ':';

/// Width of an encoded timestamp cell
pub const TIMESTAMP_WIDTH: usize = 8;

/// Why an identifier cannot be mapped to a row key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier contains the reserved separator ':'")]
    ContainsSeparator,
}

/// Check that `id` can round-trip through a row key
pub fn validate_id(id: &str) -> Result<(), IdError> {
    if id.is_empty() {
        return Err(IdError::Empty);
    }
    if id.contains(KEY_SEPARATOR) {
        return Err(IdError::ContainsSeparator);
    }
    Ok(())
}

/// Build the row key for `id` within `table`: `{id}:{table}`
pub fn encode_key(table: &str, id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(id.len() + 1 + table.len());
    key.extend_from_slice(id.as_bytes());
    key.push(KEY_SEPARATOR as u8);
    key.extend_from_slice(table.as_bytes());
    key
}

/// Recover the document id from a row key (everything before the first separator)
pub fn decode_id(key: &[u8]) -> StoreResult<String> {
    let key = std::str::from_utf8(key)
        .map_err(|e| StoreError::Corruption(format!("row key is not UTF-8: {}", e)))?;

    match key.split_once(KEY_SEPARATOR) {
        Some((id, _table)) => Ok(id.to_string()),
        None => Err(StoreError::Corruption(format!(
            "row key {:?} has no table separator",
            key
        ))),
    }
}

/// Encode a timestamp as 8 big-endian bytes
pub fn encode_timestamp(timestamp: i64) -> [u8; TIMESTAMP_WIDTH] {
    timestamp.to_be_bytes()
}

/// Decode a timestamp cell written by [`encode_timestamp`]
pub fn decode_timestamp(cell: &[u8]) -> StoreResult<i64> {
    let bytes: [u8; TIMESTAMP_WIDTH] = cell.try_into().map_err(|_| {
        StoreError::Corruption(format!(
            "timestamp cell is {} bytes, expected {}",
            cell.len(),
            TIMESTAMP_WIDTH
        ))
    })?;
    Ok(i64::from_be_bytes(bytes))
}
