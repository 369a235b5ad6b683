//! Row Log Module
//!
//! Durable backend: a [`MemoryStore`] whose every batch write is first appended
//! to an append-only log, and rebuilt from that log on open.
//!
//! ## Responsibilities
//! - Append each batch write as one record before applying it
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering and cell versions
//! - Replay on open, cutting off a torn or corrupted tail
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Record 1                                │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Puts   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Record 2                                │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Puts   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! └─────────────────────────────────────────┘
//! ```
//! Header fields are big-endian; `Puts` is bincode.

mod record;
mod recovery;
mod writer;

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::StoreResult;

use super::{MemoryStore, RowGet, RowPut, RowResult, StoreBackend};

pub use record::{LogRecord, RecordHeader, HEADER_SIZE, MAX_PAYLOAD_SIZE};
pub use recovery::{LogRecovery, RecoveryResult};
pub use writer::{LogFile, LogWriter};

/// Durable column-family store backed by a row log
pub struct LogStore {
    /// Current state of every row
    memory: MemoryStore,

    /// Serializes appends so log order matches version order
    writer: Mutex<LogWriter>,

    /// What replay found when the store was opened
    recovery: RecoveryResult,
}

impl LogStore {
    const LOG_FILENAME: &'static str = "documents.log";

    /// Open or create the store under `config.data_dir`
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Replay the log into memory (creating any family it mentions)
    /// 3. Truncate a damaged tail
    /// 4. Resume appending after the last valid LSN
    pub fn open(config: &Config) -> StoreResult<Self> {
        fs::create_dir_all(&config.data_dir)?;
        let path = config.data_dir.join(Self::LOG_FILENAME);

        let memory = MemoryStore::new().with_family(&config.column_family, config.max_versions);

        let (records, recovery) = LogRecovery::recover(&path)?;
        if recovery.records_corrupted > 0 || recovery.was_truncated {
            tracing::warn!(
                "Row log damaged: {} records recovered, {} corrupted, truncated to {} bytes",
                recovery.records_recovered,
                recovery.records_corrupted,
                recovery.valid_len
            );
        } else if recovery.records_recovered > 0 {
            tracing::info!(
                "Row log replay: {} records ({} row puts) recovered, last_lsn={}",
                recovery.records_recovered,
                records.iter().map(LogRecord::put_count).sum::<usize>(),
                recovery.last_lsn
            );
        }

        for record in records {
            let puts = record.row_puts();
            for put in &puts {
                memory.create_family(put.family.as_str(), config.max_versions);
            }
            memory.apply(&puts, record.lsn)?;
        }

        let writer = LogWriter::open(&path, config.log_sync_strategy, recovery.last_lsn + 1)?;

        Ok(Self {
            memory,
            writer: Mutex::new(writer),
            recovery,
        })
    }

    /// Force buffered log records to disk
    pub fn sync(&self) -> StoreResult<()> {
        self.writer.lock().sync()
    }

    pub fn path(&self) -> PathBuf {
        self.writer.lock().path().to_path_buf()
    }

    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Log path for a data directory
    pub fn log_path(data_dir: &Path) -> PathBuf {
        data_dir.join(Self::LOG_FILENAME)
    }
}

impl StoreBackend for LogStore {
    fn put_batch(&self, puts: &[RowPut]) -> StoreResult<()> {
        if puts.is_empty() {
            return Ok(());
        }
        // Nothing reaches the log for a batch the memory state would reject
        self.memory.check_families(puts)?;

        let mut writer = self.writer.lock();
        let lsn = writer.append(puts)?;
        self.memory.apply(puts, lsn)
    }

    fn get_batch(&self, gets: &[RowGet]) -> StoreResult<Vec<RowResult>> {
        self.memory.get_batch(gets)
    }
}
