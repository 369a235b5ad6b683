//! Log record framing
//!
//! One record per batch write. The payload is the bincode-encoded list of row
//! puts; the CRC covers the LSN and the payload.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::store::RowPut;

/// Header size: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// Largest payload a record may carry (64 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 64 * 1024 * 1024;

/// A row put as persisted in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LoggedPut {
    row: Vec<u8>,
    family: String,
    cells: Vec<(String, Vec<u8>)>,
}

/// Decoded record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub lsn: u64,
    pub crc: u32,
    pub len: u32,
}

impl RecordHeader {
    pub fn parse(mut bytes: &[u8]) -> StoreResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(StoreError::LogCorruption(format!(
                "Incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }
        Ok(Self {
            lsn: bytes.get_u64(),
            crc: bytes.get_u32(),
            len: bytes.get_u32(),
        })
    }
}

/// One logged batch
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Log Sequence Number - monotonically increasing, doubles as cell version
    pub lsn: u64,

    puts: Vec<LoggedPut>,
}

impl LogRecord {
    pub fn new(lsn: u64, puts: &[RowPut]) -> Self {
        let puts = puts
            .iter()
            .map(|put| LoggedPut {
                row: put.row.clone(),
                family: put.family.clone(),
                cells: put
                    .cells
                    .iter()
                    .map(|(column, value)| (column.clone(), value.to_vec()))
                    .collect(),
            })
            .collect();
        Self { lsn, puts }
    }

    /// The puts carried by this record
    pub fn row_puts(&self) -> Vec<RowPut> {
        self.puts
            .iter()
            .map(|put| RowPut {
                row: put.row.clone(),
                family: put.family.clone(),
                cells: put
                    .cells
                    .iter()
                    .map(|(column, value)| (column.clone(), Bytes::copy_from_slice(value)))
                    .collect(),
            })
            .collect()
    }

    pub fn put_count(&self) -> usize {
        self.puts.len()
    }

    /// Frame the record: header + payload
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        let payload =
            bincode::serialize(&self.puts).map_err(|e| StoreError::Serialization(e.to_string()))?;

        if payload.len() > MAX_PAYLOAD_SIZE as usize {
            return Err(StoreError::LogWrite(format!(
                "Record too large: {} bytes (max {})",
                payload.len(),
                MAX_PAYLOAD_SIZE
            )));
        }

        let mut frame = BytesMut::with_capacity(HEADER_SIZE + payload.len());
        frame.put_u64(self.lsn);
        frame.put_u32(checksum(self.lsn, &payload));
        frame.put_u32(payload.len() as u32);
        frame.put_slice(&payload);

        Ok(frame.to_vec())
    }

    /// Rebuild a record from its header and payload, verifying the checksum
    pub fn decode(header: RecordHeader, payload: &[u8]) -> StoreResult<Self> {
        let actual = checksum(header.lsn, payload);
        if actual != header.crc {
            return Err(StoreError::LogCorruption(format!(
                "CRC mismatch at LSN {}: expected {:08x}, got {:08x}",
                header.lsn, header.crc, actual
            )));
        }

        let puts = bincode::deserialize(payload)
            .map_err(|e| StoreError::LogCorruption(format!("LSN {}: {}", header.lsn, e)))?;

        Ok(Self {
            lsn: header.lsn,
            puts,
        })
    }
}

fn checksum(lsn: u64, payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&lsn.to_be_bytes());
    hasher.update(payload);
    hasher.finalize()
}
