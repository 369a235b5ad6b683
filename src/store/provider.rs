//! Pooled handle provider
//!
//! Hands out handles over one shared backend, bounded by a fixed number of
//! permits. Permits live in a crossbeam bounded channel: acquiring receives a
//! permit (waiting up to the acquire timeout), releasing sends it back.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use crate::config::Config;
use crate::error::{StoreError, StoreResult};

use super::{HandleProvider, RowGet, RowPut, RowResult, StoreBackend, TableHandle};

/// Snapshot of pool activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Handles currently acquired and not yet released
    pub open: usize,

    /// Total successful acquisitions
    pub acquired: u64,

    /// Total releases
    pub released: u64,

    /// Maximum handles open at once
    pub capacity: usize,
}

struct PoolState {
    permits_tx: Sender<()>,
    permits_rx: Receiver<()>,
    capacity: usize,
    acquired: AtomicU64,
    released: AtomicU64,
}

/// A slot in the pool, returned when dropped
struct Permit {
    state: Arc<PoolState>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.state.released.fetch_add(1, Ordering::SeqCst);
        // The channel has room for every permit, so this cannot be full
        let _ = self.state.permits_tx.try_send(());
    }
}

/// Handle provider over a shared [`StoreBackend`]
pub struct PooledProvider<B> {
    backend: Arc<B>,
    state: Arc<PoolState>,
    acquire_timeout: Duration,
}

impl<B: StoreBackend + 'static> PooledProvider<B> {
    /// Create a provider allowing `max_open_handles` concurrent handles
    pub fn new(backend: Arc<B>, max_open_handles: usize, acquire_timeout: Duration) -> Self {
        let capacity = max_open_handles.max(1);
        let (permits_tx, permits_rx) = channel::bounded(capacity);
        for _ in 0..capacity {
            if permits_tx.try_send(()).is_err() {
                break;
            }
        }

        Self {
            backend,
            state: Arc::new(PoolState {
                permits_tx,
                permits_rx,
                capacity,
                acquired: AtomicU64::new(0),
                released: AtomicU64::new(0),
            }),
            acquire_timeout,
        }
    }

    /// Create a provider sized by `max_open_handles` / `acquire_timeout_ms`
    pub fn from_config(backend: Arc<B>, config: &Config) -> Self {
        Self::new(backend, config.max_open_handles, config.acquire_timeout())
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            open: self.state.capacity - self.state.permits_rx.len(),
            acquired: self.state.acquired.load(Ordering::SeqCst),
            released: self.state.released.load(Ordering::SeqCst),
            capacity: self.state.capacity,
        }
    }
}

impl<B: StoreBackend + 'static> HandleProvider for PooledProvider<B> {
    fn acquire(&self) -> StoreResult<Box<dyn TableHandle>> {
        match self.state.permits_rx.recv_timeout(self.acquire_timeout) {
            Ok(()) => {}
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    "Handle pool exhausted ({} open) after {:?}",
                    self.state.capacity,
                    self.acquire_timeout
                );
                return Err(StoreError::pool_exhausted(self.acquire_timeout));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(StoreError::Handle("handle pool is closed".to_string()));
            }
        }

        self.state.acquired.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(BackendHandle {
            backend: Arc::clone(&self.backend),
            _permit: Permit {
                state: Arc::clone(&self.state),
            },
        }))
    }
}

/// A pooled handle; its permit goes back to the pool when closed or dropped
pub struct BackendHandle<B> {
    backend: Arc<B>,
    _permit: Permit,
}

impl<B: StoreBackend> TableHandle for BackendHandle<B> {
    fn put_batch(&mut self, puts: &[RowPut]) -> StoreResult<()> {
        self.backend.put_batch(puts)
    }

    fn get_batch(&mut self, gets: &[RowGet]) -> StoreResult<Vec<RowResult>> {
        self.backend.get_batch(gets)
    }

    fn close(self: Box<Self>) -> StoreResult<()> {
        // Dropping the handle drops the permit
        Ok(())
    }
}
