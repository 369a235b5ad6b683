//! Store Module
//!
//! The column-family key-value layer that documents are mapped onto.
//!
//! ## Responsibilities
//! - Row/cell request and response types (`RowPut`, `RowGet`, `RowResult`)
//! - `StoreBackend`: the narrow put-batch / get-batch surface a backend provides
//! - `TableHandle` / `HandleProvider`: live, closable sessions against a backend
//! - `HandleGuard`: scoped acquisition with release on every exit path
//!
//! ## Backends
//! - `MemoryStore`: versioned in-memory column families
//! - `LogStore`: `MemoryStore` made durable by an append-only, CRC-checked row log
//!
//! ## Data Model
//! ```text
//! family ─┬─ row key ─┬─ column ─── [newest cell, ..., oldest cell]
//!         │           └─ column ─── [...]
//!         └─ row key ─── ...
//! ```

mod guard;
mod memory;
mod provider;

pub mod log;

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::error::{StoreError, StoreResult};

pub use guard::HandleGuard;
pub use log::LogStore;
pub use memory::MemoryStore;
pub use provider::{BackendHandle, PoolStats, PooledProvider};

// =============================================================================
// Requests
// =============================================================================

/// A write of one or more cells to a single row of one column family
#[derive(Debug, Clone, PartialEq)]
pub struct RowPut {
    pub row: Vec<u8>,
    pub family: String,
    pub cells: Vec<(String, Bytes)>,
}

impl RowPut {
    pub fn new(row: impl Into<Vec<u8>>, family: impl Into<String>) -> Self {
        Self {
            row: row.into(),
            family: family.into(),
            cells: Vec::new(),
        }
    }

    /// Add a cell value for `column`
    pub fn add(mut self, column: impl Into<String>, value: impl Into<Bytes>) -> Self {
        self.cells.push((column.into(), value.into()));
        self
    }
}

/// A read of a single row of one column family
#[derive(Debug, Clone, PartialEq)]
pub struct RowGet {
    pub row: Vec<u8>,
    pub family: String,
    /// Columns to return; empty means every column in the row
    pub columns: Vec<String>,
    /// Versions to return per column, newest first
    pub max_versions: usize,
}

impl RowGet {
    /// Read every retained version of every column unless narrowed
    pub fn new(row: impl Into<Vec<u8>>, family: impl Into<String>) -> Self {
        Self {
            row: row.into(),
            family: family.into(),
            columns: Vec::new(),
            max_versions: usize::MAX,
        }
    }

    pub fn add_column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    pub fn max_versions(mut self, versions: usize) -> Self {
        self.max_versions = versions;
        self
    }
}

// =============================================================================
// Responses
// =============================================================================

/// One stored version of a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub version: u64,
    pub value: Bytes,
}

/// The cells returned for one requested row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowResult {
    row: Vec<u8>,
    cells: BTreeMap<String, Vec<Cell>>,
}

impl RowResult {
    /// `cells` holds versions newest first
    pub fn new(row: Vec<u8>, cells: BTreeMap<String, Vec<Cell>>) -> Self {
        Self { row, cells }
    }

    /// A result for a row that does not exist
    pub fn empty(row: Vec<u8>) -> Self {
        Self {
            row,
            cells: BTreeMap::new(),
        }
    }

    pub fn row(&self) -> &[u8] {
        &self.row
    }

    pub fn is_empty(&self) -> bool {
        self.cells.values().all(Vec::is_empty)
    }

    /// Newest value of `column`
    pub fn value(&self, column: &str) -> Option<&Bytes> {
        self.cells
            .get(column)
            .and_then(|versions| versions.first())
            .map(|cell| &cell.value)
    }

    /// Every returned version of `column`, newest first
    pub fn versions(&self, column: &str) -> &[Cell] {
        self.cells.get(column).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }
}

// =============================================================================
// Traits
// =============================================================================

/// A column-family key-value backend.
///
/// Batches are applied row by row; there is no cross-row transaction, but a
/// batch naming an unknown column family is rejected before any row is written.
pub trait StoreBackend: Send + Sync {
    /// Write every put in one call
    fn put_batch(&self, puts: &[RowPut]) -> StoreResult<()>;

    /// Read every row in one call; results are positional
    fn get_batch(&self, gets: &[RowGet]) -> StoreResult<Vec<RowResult>>;
}

/// A live session against a backend.
///
/// Closing consumes the handle, so a handle can be released at most once.
pub trait TableHandle: Send {
    fn put_batch(&mut self, puts: &[RowPut]) -> StoreResult<()>;

    fn get_batch(&mut self, gets: &[RowGet]) -> StoreResult<Vec<RowResult>>;

    fn close(self: Box<Self>) -> StoreResult<()>;

    fn put(&mut self, put: RowPut) -> StoreResult<()> {
        self.put_batch(std::slice::from_ref(&put))
    }

    fn get(&mut self, get: RowGet) -> StoreResult<RowResult> {
        self.get_batch(std::slice::from_ref(&get))?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("empty response to a single-row read".to_string()))
    }
}

/// Supplies table handles; shared across threads for the life of a store
pub trait HandleProvider: Send + Sync {
    fn acquire(&self) -> StoreResult<Box<dyn TableHandle>>;
}
