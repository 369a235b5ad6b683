//! Document definition

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DataStoreError, Result};

use super::validate_id;

/// The unit of storage: identifier, timestamp and an opaque JSON payload.
///
/// Immutable once built; the store never keeps a reference after a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: String,
    timestamp: i64,
    data: Value,
}

impl Document {
    /// Create a new document
    pub fn new(id: impl Into<String>, timestamp: i64, data: Value) -> Self {
        Self {
            id: id.into(),
            timestamp,
            data,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_parts(self) -> (String, i64, Value) {
        (self.id, self.timestamp, self.data)
    }

    /// Check that this document can be written.
    ///
    /// The id must be non-empty and free of the key separator, and the payload
    /// must not be `null`. Any timestamp is accepted.
    pub fn validate(&self) -> Result<()> {
        validate_id(&self.id).map_err(|e| {
            DataStoreError::InvalidDocument(format!("document {:?}: {}", self.id, e))
        })?;

        if self.data.is_null() {
            return Err(DataStoreError::InvalidDocument(format!(
                "document {:?}: data is null",
                self.id
            )));
        }

        Ok(())
    }
}
