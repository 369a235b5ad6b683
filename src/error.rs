//! Error types for AtlasDoc
//!
//! Two layers:
//! - [`StoreError`]: failures raised by the column-family backend, the handle
//!   provider, the payload codec, or the durable log.
//! - [`DataStoreError`]: the typed taxonomy returned by document operations.
//!   Every underlying failure is wrapped into one of the `*Failed` kinds with
//!   the original [`StoreError`] kept as its `source()`.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for document operations
pub type Result<T> = std::result::Result<T, DataStoreError>;

/// Result type alias for backend operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures surfaced by the layers beneath the document store
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Backend Errors
    // -------------------------------------------------------------------------
    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    #[error("Corrupted cell: {0}")]
    Corruption(String),

    #[error("Backend error: {0}")]
    Backend(String),

    // -------------------------------------------------------------------------
    // Log Errors
    // -------------------------------------------------------------------------
    #[error("Log corruption detected: {0}")]
    LogCorruption(String),

    #[error("Log write failed: {0}")]
    LogWrite(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Handle Errors
    // -------------------------------------------------------------------------
    #[error("No table handle available after {waited_ms} ms")]
    PoolExhausted { waited_ms: u64 },

    #[error("Handle error: {0}")]
    Handle(String),
}

impl StoreError {
    /// Pool exhaustion after waiting `waited`; saturates at `u64::MAX` ms
    pub fn pool_exhausted(waited: Duration) -> Self {
        StoreError::PoolExhausted {
            waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Whether retrying the same call may succeed without any change
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::PoolExhausted { .. } | StoreError::Io(_))
    }
}

/// Stable codes for each kind of document store failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidDocument,
    InvalidRequest,
    NoDataFoundForId,
    NoDataFoundForIds,
    SingleSave,
    MultiSave,
    SingleGet,
    MultiGet,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidDocument => "STORE_INVALID_DOCUMENT",
            ErrorCode::InvalidRequest => "STORE_INVALID_REQUEST",
            ErrorCode::NoDataFoundForId => "STORE_NO_DATA_FOUND_FOR_ID",
            ErrorCode::NoDataFoundForIds => "STORE_NO_DATA_FOUND_FOR_IDS",
            ErrorCode::SingleSave => "STORE_SINGLE_SAVE",
            ErrorCode::MultiSave => "STORE_MULTI_SAVE",
            ErrorCode::SingleGet => "STORE_SINGLE_GET",
            ErrorCode::MultiGet => "STORE_MULTI_GET",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed failure for every non-success path of a document operation
#[derive(Debug, Error)]
pub enum DataStoreError {
    // -------------------------------------------------------------------------
    // Validation Errors (raised before any I/O)
    // -------------------------------------------------------------------------
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // -------------------------------------------------------------------------
    // Missing Data
    // -------------------------------------------------------------------------
    #[error("No data found for ID: {id}")]
    NotFound { id: String },

    #[error("No data found for IDs: {}", .ids.join(", "))]
    NotFoundForIds { ids: Vec<String> },

    // -------------------------------------------------------------------------
    // Wrapped Underlying Failures
    // -------------------------------------------------------------------------
    #[error("Saving document error: {source}")]
    SingleSaveFailed { source: StoreError },

    #[error("Saving documents error: {source}")]
    MultiSaveFailed { source: StoreError },

    #[error("Fetching document error: {source}")]
    SingleGetFailed { source: StoreError },

    #[error("Fetching documents error: {source}")]
    MultiGetFailed { source: StoreError },
}

impl DataStoreError {
    /// The stable code for this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            DataStoreError::InvalidDocument(_) => ErrorCode::InvalidDocument,
            DataStoreError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            DataStoreError::NotFound { .. } => ErrorCode::NoDataFoundForId,
            DataStoreError::NotFoundForIds { .. } => ErrorCode::NoDataFoundForIds,
            DataStoreError::SingleSaveFailed { .. } => ErrorCode::SingleSave,
            DataStoreError::MultiSaveFailed { .. } => ErrorCode::MultiSave,
            DataStoreError::SingleGetFailed { .. } => ErrorCode::SingleGet,
            DataStoreError::MultiGetFailed { .. } => ErrorCode::MultiGet,
        }
    }

    /// The underlying failure, if this error wraps one
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            DataStoreError::SingleSaveFailed { source }
            | DataStoreError::MultiSaveFailed { source }
            | DataStoreError::SingleGetFailed { source }
            | DataStoreError::MultiGetFailed { source } => Some(source),
            _ => None,
        }
    }

    /// Whether an upstream caller may retry the same call unchanged.
    ///
    /// Validation and not-found failures are never retryable.
    pub fn is_retryable(&self) -> bool {
        self.store_error().map_or(false, StoreError::is_transient)
    }
}
