//! Log Recovery
//!
//! Replays the row log after a restart or crash.

use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::error::StoreResult;

use super::record::{RecordHeader, HEADER_SIZE, MAX_PAYLOAD_SIZE};
use super::LogRecord;

/// Outcome of scanning a log file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecoveryResult {
    /// Number of records successfully recovered
    pub records_recovered: u64,

    /// Number of damaged records found (scanning stops at the first)
    pub records_corrupted: u64,

    /// Last valid LSN (0 for an empty log)
    pub last_lsn: u64,

    /// Length of the valid prefix of the file
    pub valid_len: u64,

    /// Whether bytes past the valid prefix were cut off
    pub was_truncated: bool,
}

/// Handles log replay
pub struct LogRecovery;

impl LogRecovery {
    /// Recover records from a log file
    ///
    /// This will:
    /// 1. Read records in order while they are whole and their CRC matches
    /// 2. Stop at the first torn, oversized, out-of-order or corrupted record
    /// 3. Truncate the file to the valid prefix
    pub fn recover(path: &Path) -> StoreResult<(Vec<LogRecord>, RecoveryResult)> {
        let (records, mut result, file_len) = Self::scan(path)?;

        if result.valid_len < file_len {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(result.valid_len)?;
            file.sync_all()?;
            result.was_truncated = true;
        }

        Ok((records, result))
    }

    /// Scan a log file without modifying it
    pub fn verify(path: &Path) -> StoreResult<RecoveryResult> {
        let (_, result, _) = Self::scan(path)?;
        Ok(result)
    }

    fn scan(path: &Path) -> StoreResult<(Vec<LogRecord>, RecoveryResult, u64)> {
        let mut result = RecoveryResult::default();

        if !path.exists() {
            return Ok((Vec::new(), result, 0));
        }

        let bytes = fs::read(path)?;
        let mut records = Vec::new();
        let mut offset = 0usize;

        while offset < bytes.len() {
            let remaining = &bytes[offset..];

            // Torn header at the tail
            if remaining.len() < HEADER_SIZE {
                break;
            }

            let header = RecordHeader::parse(remaining)?;
            if header.len > MAX_PAYLOAD_SIZE || header.lsn <= result.last_lsn {
                result.records_corrupted += 1;
                break;
            }

            let end = HEADER_SIZE + header.len as usize;
            // Torn payload at the tail
            if remaining.len() < end {
                break;
            }

            match LogRecord::decode(header, &remaining[HEADER_SIZE..end]) {
                Ok(record) => {
                    result.records_recovered += 1;
                    result.last_lsn = record.lsn;
                    records.push(record);
                    offset += end;
                }
                Err(e) => {
                    tracing::warn!("Stopping log replay at offset {}: {}", offset, e);
                    result.records_corrupted += 1;
                    break;
                }
            }
        }

        result.valid_len = offset as u64;
        Ok((records, result, bytes.len() as u64))
    }
}
