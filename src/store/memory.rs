//! In-memory column-family store
//!
//! BTreeMap rows per family behind a parking_lot RwLock. Every batch write is
//! stamped with one version from a monotonic clock; each cell keeps at most the
//! family's `max_versions` newest values.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::{StoreError, StoreResult};

use super::{Cell, RowGet, RowPut, RowResult, StoreBackend};

type Row = BTreeMap<String, VecDeque<Cell>>;

struct Family {
    max_versions: usize,
    rows: BTreeMap<Vec<u8>, Row>,
}

/// Versioned in-memory column families
///
/// ## Concurrency:
/// - `families`: RwLock (concurrent readers, one writer per batch)
/// - `clock`: atomic, lock-free
pub struct MemoryStore {
    families: RwLock<HashMap<String, Family>>,
    clock: AtomicU64,
}

impl MemoryStore {
    /// Create a store with no column families
    pub fn new() -> Self {
        Self {
            families: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
        }
    }

    /// Builder-style [`create_family`](Self::create_family)
    pub fn with_family(self, name: impl Into<String>, max_versions: usize) -> Self {
        self.create_family(name, max_versions);
        self
    }

    /// Create a column family if it does not exist yet
    pub fn create_family(&self, name: impl Into<String>, max_versions: usize) {
        self.families
            .write()
            .entry(name.into())
            .or_insert_with(|| Family {
                max_versions: max_versions.max(1),
                rows: BTreeMap::new(),
            });
    }

    pub fn has_family(&self, name: &str) -> bool {
        self.families.read().contains_key(name)
    }

    /// Number of rows stored in `family` (0 if it does not exist)
    pub fn row_count(&self, family: &str) -> usize {
        self.families
            .read()
            .get(family)
            .map_or(0, |f| f.rows.len())
    }

    /// Latest version handed out or applied
    pub fn current_version(&self) -> u64 {
        self.clock.load(Ordering::SeqCst)
    }

    /// Reject the batch if it names a family that does not exist
    pub fn check_families(&self, puts: &[RowPut]) -> StoreResult<()> {
        let families = self.families.read();
        match puts.iter().find(|put| !families.contains_key(&put.family)) {
            Some(put) => Err(StoreError::ColumnFamilyNotFound(put.family.clone())),
            None => Ok(()),
        }
    }

    /// Apply a batch with an explicit version stamp
    ///
    /// The clock is advanced to at least `version` so later writes stay newer.
    pub(crate) fn apply(&self, puts: &[RowPut], version: u64) -> StoreResult<()> {
        let mut families = self.families.write();
        Self::write_cells(&mut families, puts, version)?;
        self.clock.fetch_max(version, Ordering::SeqCst);
        Ok(())
    }

    fn write_cells(
        families: &mut HashMap<String, Family>,
        puts: &[RowPut],
        version: u64,
    ) -> StoreResult<()> {
        if let Some(put) = puts.iter().find(|put| !families.contains_key(&put.family)) {
            return Err(StoreError::ColumnFamilyNotFound(put.family.clone()));
        }

        for put in puts {
            let Some(family) = families.get_mut(&put.family) else {
                continue;
            };
            let max_versions = family.max_versions;
            let row = family.rows.entry(put.row.clone()).or_default();

            for (column, value) in &put.cells {
                let versions = row.entry(column.clone()).or_default();
                versions.push_front(Cell {
                    version,
                    value: value.clone(),
                });
                versions.truncate(max_versions);
            }
        }
        Ok(())
    }

    fn read_row(family: &Family, get: &RowGet) -> RowResult {
        let Some(row) = family.rows.get(&get.row) else {
            return RowResult::empty(get.row.clone());
        };

        let wanted = |column: &String| get.columns.is_empty() || get.columns.contains(column);

        let cells: BTreeMap<String, Vec<Cell>> = row
            .iter()
            .filter(|(column, _)| wanted(*column))
            .map(|(column, versions)| {
                let cells: Vec<Cell> = versions.iter().take(get.max_versions).cloned().collect();
                (column.clone(), cells)
            })
            .filter(|(_, cells)| !cells.is_empty())
            .collect();

        RowResult::new(get.row.clone(), cells)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreBackend for MemoryStore {
    fn put_batch(&self, puts: &[RowPut]) -> StoreResult<()> {
        if puts.is_empty() {
            return Ok(());
        }
        // Stamp under the write lock so versions land in order
        let mut families = self.families.write();
        let version = self.clock.load(Ordering::SeqCst) + 1;
        Self::write_cells(&mut families, puts, version)?;
        self.clock.store(version, Ordering::SeqCst);
        Ok(())
    }

    fn get_batch(&self, gets: &[RowGet]) -> StoreResult<Vec<RowResult>> {
        let families = self.families.read();

        gets.iter()
            .map(|get| {
                families
                    .get(&get.family)
                    .map(|family| Self::read_row(family, get))
                    .ok_or_else(|| StoreError::ColumnFamilyNotFound(get.family.clone()))
            })
            .collect()
    }
}
