//! Datastore Module
//!
//! Maps documents onto rows of one column family and back.
//!
//! ## Responsibilities
//! - Validate inputs before any I/O
//! - Build one row put / row get per document, always through the same helpers
//! - Acquire exactly one handle per call and release it on every exit path
//! - Classify every failure into a [`DataStoreError`]
//!
//! ## Call Flow
//! ```text
//! save/get ──► validate ──► build rows ──► HandleGuard::acquire
//!                                              │
//!                                   put_batch / get_batch
//!                                              │
//!                               guard dropped (handle closed)
//!                                              │
//!                                 decode rows ──► result
//! ```

use std::sync::Arc;

use crate::codec::{JsonCodec, PayloadCodec};
use crate::config::Config;
use crate::document::{
    decode_id, decode_timestamp, encode_key, encode_timestamp, validate_id, Document, DATA_COLUMN,
    TIMESTAMP_COLUMN,
};
use crate::error::{DataStoreError, Result, StoreError, StoreResult};
use crate::store::{
    HandleGuard, HandleProvider, LogStore, MemoryStore, PooledProvider, RowGet, RowPut, RowResult,
};

/// Document persistence operations consumed by request handlers
pub trait DataStore: Send + Sync {
    /// Write one document
    fn save(&self, table: &str, document: &Document) -> Result<()>;

    /// Write every document in one underlying call.
    ///
    /// Any invalid document fails the whole batch before anything is written.
    fn save_all(&self, table: &str, documents: &[Document]) -> Result<()>;

    /// Read one document
    fn get(&self, table: &str, id: &str) -> Result<Document>;

    /// Read documents in the order of `ids`.
    ///
    /// Fails with [`DataStoreError::NotFoundForIds`] if any id is missing; no
    /// partial result is returned.
    fn get_all(&self, table: &str, ids: &[String]) -> Result<Vec<Document>>;
}

/// [`DataStore`] over a column-family handle provider
///
/// Holds only shared immutable collaborators, so one instance can serve any
/// number of threads; each call acquires its own handle.
pub struct DocumentStore {
    provider: Arc<dyn HandleProvider>,
    codec: Arc<dyn PayloadCodec>,
    column_family: String,
    max_batch_size: usize,
}

impl DocumentStore {
    /// Create a store over custom collaborators
    pub fn new(
        provider: Arc<dyn HandleProvider>,
        codec: Arc<dyn PayloadCodec>,
        config: &Config,
    ) -> Self {
        Self {
            provider,
            codec,
            column_family: config.column_family.clone(),
            max_batch_size: config.max_batch_size,
        }
    }

    /// In-memory store with a pooled provider and the JSON codec
    pub fn in_memory(config: &Config) -> Self {
        let backend = Arc::new(
            MemoryStore::new().with_family(&config.column_family, config.max_versions),
        );
        let provider = Arc::new(PooledProvider::from_config(backend, config));
        Self::new(provider, Arc::new(JsonCodec), config)
    }

    /// Durable store under `config.data_dir` with a pooled provider and the JSON codec
    pub fn open(config: &Config) -> StoreResult<Self> {
        let backend = Arc::new(LogStore::open(config)?);
        let provider = Arc::new(PooledProvider::from_config(backend, config));
        Ok(Self::new(provider, Arc::new(JsonCodec), config))
    }

    pub fn column_family(&self) -> &str {
        &self.column_family
    }

    // =========================================================================
    // Validation
    // =========================================================================

    fn check_table(table: &str) -> Result<()> {
        if table.is_empty() {
            return Err(DataStoreError::InvalidRequest(
                "table name is empty".to_string(),
            ));
        }
        Ok(())
    }

    fn check_batch_size(&self, len: usize) -> Result<()> {
        if len > self.max_batch_size {
            return Err(DataStoreError::InvalidRequest(format!(
                "batch of {} exceeds the limit of {}",
                len, self.max_batch_size
            )));
        }
        Ok(())
    }

    fn check_read_id(id: &str) -> Result<()> {
        validate_id(id)
            .map_err(|e| DataStoreError::InvalidRequest(format!("id {:?}: {}", id, e)))
    }

    // =========================================================================
    // Row Mapping
    // =========================================================================

    fn row_put(&self, table: &str, document: &Document) -> StoreResult<RowPut> {
        let data = self.codec.encode(document.data())?;
        Ok(RowPut::new(encode_key(table, document.id()), self.column_family.as_str())
            .add(DATA_COLUMN, data)
            .add(TIMESTAMP_COLUMN, encode_timestamp(document.timestamp()).to_vec()))
    }

    fn row_get(&self, table: &str, id: &str) -> RowGet {
        RowGet::new(encode_key(table, id), self.column_family.as_str())
            .add_column(DATA_COLUMN)
            .add_column(TIMESTAMP_COLUMN)
            .max_versions(1)
    }

    /// Rebuild a document from a non-empty row; the id comes from the row key
    fn read_document(&self, result: &RowResult) -> StoreResult<Document> {
        let id = decode_id(result.row())?;
        let data = result.value(DATA_COLUMN).ok_or_else(|| {
            StoreError::Corruption(format!("row for {:?} has no {} cell", id, DATA_COLUMN))
        })?;
        let timestamp = result.value(TIMESTAMP_COLUMN).ok_or_else(|| {
            StoreError::Corruption(format!("row for {:?} has no {} cell", id, TIMESTAMP_COLUMN))
        })?;

        Ok(Document::new(
            id,
            decode_timestamp(timestamp)?,
            self.codec.decode(data)?,
        ))
    }

    // =========================================================================
    // Handle Scopes (one acquisition per call)
    // =========================================================================

    fn write_rows(&self, puts: &[RowPut]) -> StoreResult<()> {
        let mut guard = HandleGuard::acquire(self.provider.as_ref())?;
        let handle = guard.handle()?;
        handle.put_batch(puts)
    }

    fn read_row(&self, get: RowGet) -> StoreResult<RowResult> {
        let mut guard = HandleGuard::acquire(self.provider.as_ref())?;
        let handle = guard.handle()?;
        handle.get(get)
    }

    fn read_rows(&self, gets: &[RowGet]) -> StoreResult<Vec<RowResult>> {
        let mut guard = HandleGuard::acquire(self.provider.as_ref())?;
        let handle = guard.handle()?;
        let results = handle.get_batch(gets)?;

        if results.len() != gets.len() {
            return Err(StoreError::Backend(format!(
                "batch read returned {} rows for {} requests",
                results.len(),
                gets.len()
            )));
        }
        Ok(results)
    }
}

impl DataStore for DocumentStore {
    fn save(&self, table: &str, document: &Document) -> Result<()> {
        Self::check_table(table)?;
        document.validate()?;

        tracing::debug!("Saving document {:?} to table {}", document.id(), table);

        self.row_put(table, document)
            .and_then(|put| self.write_rows(std::slice::from_ref(&put)))
            .map_err(|source| DataStoreError::SingleSaveFailed { source })
    }

    fn save_all(&self, table: &str, documents: &[Document]) -> Result<()> {
        Self::check_table(table)?;
        self.check_batch_size(documents.len())?;
        for document in documents {
            document.validate()?;
        }

        tracing::debug!("Saving {} documents to table {}", documents.len(), table);

        documents
            .iter()
            .map(|document| self.row_put(table, document))
            .collect::<StoreResult<Vec<_>>>()
            .and_then(|puts| self.write_rows(&puts))
            .map_err(|source| DataStoreError::MultiSaveFailed { source })
    }

    fn get(&self, table: &str, id: &str) -> Result<Document> {
        Self::check_table(table)?;
        Self::check_read_id(id)?;

        tracing::debug!("Fetching document {:?} from table {}", id, table);

        let result = self
            .read_row(self.row_get(table, id))
            .map_err(|source| DataStoreError::SingleGetFailed { source })?;

        if result.is_empty() {
            return Err(DataStoreError::NotFound { id: id.to_string() });
        }

        self.read_document(&result)
            .map_err(|source| DataStoreError::SingleGetFailed { source })
    }

    fn get_all(&self, table: &str, ids: &[String]) -> Result<Vec<Document>> {
        Self::check_table(table)?;
        self.check_batch_size(ids.len())?;
        for id in ids {
            Self::check_read_id(id)?;
        }

        tracing::debug!("Fetching {} documents from table {}", ids.len(), table);

        let gets: Vec<RowGet> = ids.iter().map(|id| self.row_get(table, id)).collect();
        let results = self
            .read_rows(&gets)
            .map_err(|source| DataStoreError::MultiGetFailed { source })?;

        let missing: Vec<String> = ids
            .iter()
            .zip(&results)
            .filter(|(_, result)| result.is_empty())
            .map(|(id, _)| id.clone())
            .collect();
        if !missing.is_empty() {
            return Err(DataStoreError::NotFoundForIds { ids: missing });
        }

        results
            .iter()
            .map(|result| self.read_document(result))
            .collect::<StoreResult<Vec<_>>>()
            .map_err(|source| DataStoreError::MultiGetFailed { source })
    }
}
