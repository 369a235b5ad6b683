//! Log Writer
//!
//! Appends framed records to the row log.
//!
//! A record is acknowledged only once it is fully written (and synced when the
//! strategy asks for it). If any step fails, the file is cut back to the end of
//! the last acknowledged record and anything still buffered is discarded, so a
//! failed append never reappears on replay. If that cut itself fails the writer
//! refuses every later append.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::SyncStrategy;
use crate::error::{StoreError, StoreResult};
use crate::store::RowPut;

use super::LogRecord;

/// File operations the writer needs beyond [`Write`]
pub trait LogFile: Write + Send {
    /// Current length in bytes
    fn size(&self) -> io::Result<u64>;

    /// Cut the file to `len` bytes
    fn truncate(&self, len: u64) -> io::Result<()>;

    /// Flush file contents to stable storage
    fn sync_data(&self) -> io::Result<()>;
}

impl LogFile for File {
    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync_data(&self) -> io::Result<()> {
        File::sync_data(self)
    }
}

/// Appends records to the log file
pub struct LogWriter<F: LogFile = File> {
    path: PathBuf,
    /// `None` once a failed append could not be rolled back
    writer: Option<BufWriter<F>>,
    /// File length up to the end of the last acknowledged record
    committed_len: u64,
    next_lsn: u64,
    sync_strategy: SyncStrategy,
    /// Records written since the last fsync
    unsynced: usize,
}

impl LogWriter<File> {
    /// Open or create the log file for appending; the next record gets `next_lsn`
    pub fn open(path: &Path, sync_strategy: SyncStrategy, next_lsn: u64) -> StoreResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Self::from_file(path, file, sync_strategy, next_lsn)
    }
}

impl<F: LogFile> LogWriter<F> {
    /// Append to an already opened log file, positioned at its end
    pub fn from_file(
        path: impl Into<PathBuf>,
        file: F,
        sync_strategy: SyncStrategy,
        next_lsn: u64,
    ) -> StoreResult<Self> {
        let committed_len = file.size()?;

        Ok(Self {
            path: path.into(),
            writer: Some(BufWriter::new(file)),
            committed_len,
            next_lsn: next_lsn.max(1),
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Append one batch as a single record, returning its LSN
    pub fn append(&mut self, puts: &[RowPut]) -> StoreResult<u64> {
        let lsn = self.next_lsn;
        let frame = LogRecord::new(lsn, puts).encode()?;

        let writer = self.live()?;
        if let Err(e) = writer.write_all(&frame).and_then(|_| writer.flush()) {
            self.rollback();
            return Err(StoreError::LogWrite(format!("LSN {}: {}", lsn, e)));
        }

        let pending = self.unsynced + 1;
        let due = match self.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNEntries { count } => pending >= count.max(1),
        };
        if due {
            if let Err(e) = self.sync() {
                self.rollback();
                return Err(StoreError::LogWrite(format!("LSN {}: sync failed: {}", lsn, e)));
            }
        } else {
            self.unsynced = pending;
        }

        self.committed_len += frame.len() as u64;
        self.next_lsn += 1;
        Ok(lsn)
    }

    /// Force buffered records to disk
    pub fn sync(&mut self) -> StoreResult<()> {
        let writer = self.live()?;
        writer.flush()?;
        writer.get_ref().sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// LSN the next record will get
    pub fn next_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Length of the log up to the last acknowledged record
    pub fn committed_len(&self) -> u64 {
        self.committed_len
    }

    /// Whether an unrecoverable append failure has disabled this writer
    pub fn is_poisoned(&self) -> bool {
        self.writer.is_none()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn live(&mut self) -> StoreResult<&mut BufWriter<F>> {
        let path = &self.path;
        self.writer.as_mut().ok_or_else(|| {
            StoreError::LogWrite(format!(
                "{} is unusable: a failed append could not be rolled back",
                path.display()
            ))
        })
    }

    /// Cut the file back to the last acknowledged record, dropping unwritten bytes
    fn rollback(&mut self) {
        let Some(writer) = self.writer.take() else {
            return;
        };
        let (file, _discarded) = writer.into_parts();

        match file
            .truncate(self.committed_len)
            .and_then(|_| file.sync_data())
        {
            Ok(()) => {
                tracing::warn!(
                    "Rolled back failed append to {} at {} bytes",
                    self.path.display(),
                    self.committed_len
                );
                self.writer = Some(BufWriter::new(file));
            }
            Err(e) => {
                tracing::error!(
                    "Failed to roll back {} to {} bytes, refusing further appends: {}",
                    self.path.display(),
                    self.committed_len,
                    e
                );
            }
        }
    }
}
