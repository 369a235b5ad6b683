//! Scoped handle acquisition
//!
//! A `HandleGuard` owns one handle from acquisition until it goes out of scope.
//! The handle is closed in `Drop`, so release happens exactly once on every exit
//! path: normal return, `?` propagation, or unwinding from a panic.

use crate::error::{StoreError, StoreResult};

use super::{HandleProvider, TableHandle};

pub struct HandleGuard {
    /// `Some` from acquisition until `Drop` takes it to close
    handle: Option<Box<dyn TableHandle>>,
}

impl HandleGuard {
    /// Acquire a handle from `provider`
    pub fn acquire(provider: &dyn HandleProvider) -> StoreResult<Self> {
        let handle = provider.acquire()?;
        Ok(Self {
            handle: Some(handle),
        })
    }

    /// The live handle
    ///
    /// The handle sits in an `Option` only so `Drop` can move it out and pass it
    /// to [`TableHandle::close`], which consumes it. Nothing else takes it, so
    /// this returns `Ok` for as long as the guard exists.
    pub fn handle(&mut self) -> StoreResult<&mut (dyn TableHandle + 'static)> {
        self.handle
            .as_deref_mut()
            .ok_or_else(|| StoreError::Handle("table handle already released".to_string()))
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            // Close failures must never replace the outcome of the call
            if let Err(e) = handle.close() {
                tracing::error!("Error closing table handle: {}", e);
            }
        }
    }
}
