//! Failure classification tests for DocumentStore
//!
//! These tests verify:
//! - Acquire, backend, codec, and decode failures map to the right error kind
//! - The underlying error is preserved as the source
//! - A failing close never changes the outcome of a call
//! - Handles are released after every failure

use std::error::Error as _;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use atlasdoc::store::{
    HandleProvider, MemoryStore, PooledProvider, RowGet, RowPut, RowResult, StoreBackend,
    TableHandle,
};
use atlasdoc::{
    Config, DataStore, DataStoreError, Document, DocumentStore, ErrorCode, JsonCodec,
    PayloadCodec, StoreError, StoreResult,
};
use serde_json::{json, Value};

// =============================================================================
// Test Doubles
// =============================================================================

const TABLE: &str = "events";

/// Which step of a scripted handle should fail
#[derive(Clone, Copy, Default)]
struct Faults {
    acquire: bool,
    put: bool,
    get: bool,
    close: bool,
}

#[derive(Default)]
struct Counters {
    acquired: AtomicUsize,
    closed: AtomicUsize,
}

/// Provider whose handles delegate to a MemoryStore unless told to fail
struct ScriptedProvider {
    backend: Arc<MemoryStore>,
    faults: Faults,
    counters: Arc<Counters>,
}

struct ScriptedHandle {
    backend: Arc<MemoryStore>,
    faults: Faults,
    counters: Arc<Counters>,
}

impl HandleProvider for ScriptedProvider {
    fn acquire(&self) -> StoreResult<Box<dyn TableHandle>> {
        if self.faults.acquire {
            return Err(StoreError::PoolExhausted { waited_ms: 1 });
        }
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedHandle {
            backend: Arc::clone(&self.backend),
            faults: self.faults,
            counters: Arc::clone(&self.counters),
        }))
    }
}

impl TableHandle for ScriptedHandle {
    fn put_batch(&mut self, puts: &[RowPut]) -> StoreResult<()> {
        if self.faults.put {
            return Err(StoreError::Backend("region server unavailable".to_string()));
        }
        self.backend.put_batch(puts)
    }

    fn get_batch(&mut self, gets: &[RowGet]) -> StoreResult<Vec<RowResult>> {
        if self.faults.get {
            return Err(StoreError::Backend("region server unavailable".to_string()));
        }
        self.backend.get_batch(gets)
    }

    fn close(self: Box<Self>) -> StoreResult<()> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        if self.faults.close {
            return Err(StoreError::Handle("close failed".to_string()));
        }
        Ok(())
    }
}

/// Codec that refuses every payload
struct BrokenCodec;

impl PayloadCodec for BrokenCodec {
    fn encode(&self, _value: &Value) -> StoreResult<Vec<u8>> {
        Err(StoreError::Serialization("encoder offline".to_string()))
    }

    fn decode(&self, _bytes: &[u8]) -> StoreResult<Value> {
        Err(StoreError::Serialization("decoder offline".to_string()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Fixture {
    store: DocumentStore,
    backend: Arc<MemoryStore>,
    counters: Arc<Counters>,
}

fn setup_backend() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new().with_family("d", 3))
}

fn setup_scripted(faults: Faults) -> Fixture {
    setup_scripted_on(setup_backend(), faults)
}

fn setup_scripted_on(backend: Arc<MemoryStore>, faults: Faults) -> Fixture {
    let counters = Arc::new(Counters::default());
    let provider = Arc::new(ScriptedProvider {
        backend: Arc::clone(&backend),
        faults,
        counters: Arc::clone(&counters),
    });
    let store = DocumentStore::new(provider, Arc::new(JsonCodec), &Config::default());
    Fixture {
        store,
        backend,
        counters,
    }
}

fn doc(id: &str) -> Document {
    Document::new(id, 1, json!({ "id": id }))
}

fn assert_balanced(counters: &Counters) {
    assert_eq!(
        counters.acquired.load(Ordering::SeqCst),
        counters.closed.load(Ordering::SeqCst)
    );
}

// =============================================================================
// Acquire Failures
// =============================================================================

#[test]
fn test_acquire_failure_on_save() {
    let f = setup_scripted(Faults {
        acquire: true,
        ..Faults::default()
    });

    let single = f.store.save(TABLE, &doc("a")).unwrap_err();
    let multi = f.store.save_all(TABLE, &[doc("a")]).unwrap_err();

    assert!(matches!(
        single,
        DataStoreError::SingleSaveFailed {
            source: StoreError::PoolExhausted { .. }
        }
    ));
    assert!(matches!(multi, DataStoreError::MultiSaveFailed { .. }));
    assert!(single.is_retryable());
    assert!(multi.is_retryable());
}

#[test]
fn test_acquire_failure_on_get() {
    let f = setup_scripted(Faults {
        acquire: true,
        ..Faults::default()
    });

    assert_eq!(f.store.get(TABLE, "a").unwrap_err().code(), ErrorCode::SingleGet);
    assert_eq!(
        f.store.get_all(TABLE, &["a".to_string()]).unwrap_err().code(),
        ErrorCode::MultiGet
    );
}

#[test]
fn test_pool_exhaustion_surfaces_as_save_failure() {
    let backend = setup_backend();
    let provider = Arc::new(PooledProvider::new(backend, 1, Duration::from_millis(20)));
    let store = DocumentStore::new(provider.clone(), Arc::new(JsonCodec), &Config::default());

    let held = provider.acquire().unwrap();
    let err = store.save(TABLE, &doc("a")).unwrap_err();
    held.close().unwrap();

    assert!(matches!(
        err.store_error(),
        Some(StoreError::PoolExhausted { waited_ms: 20 })
    ));
    assert!(store.save(TABLE, &doc("a")).is_ok());
}

// =============================================================================
// Backend Failures
// =============================================================================

#[test]
fn test_put_failure_is_wrapped_with_source() {
    let f = setup_scripted(Faults {
        put: true,
        ..Faults::default()
    });

    let err = f.store.save(TABLE, &doc("a")).unwrap_err();

    assert_eq!(err.code(), ErrorCode::SingleSave);
    assert!(!err.is_retryable());
    let source = err.source().map(|s| s.to_string()).unwrap_or_default();
    assert!(source.contains("region server unavailable"));
    assert_balanced(&f.counters);
}

#[test]
fn test_put_failure_on_batch() {
    let f = setup_scripted(Faults {
        put: true,
        ..Faults::default()
    });

    let err = f.store.save_all(TABLE, &[doc("a"), doc("b")]).unwrap_err();

    assert_eq!(err.code(), ErrorCode::MultiSave);
    assert_eq!(f.backend.row_count("d"), 0);
    assert_balanced(&f.counters);
}

#[test]
fn test_get_failure_is_wrapped() {
    let f = setup_scripted(Faults {
        get: true,
        ..Faults::default()
    });

    let single = f.store.get(TABLE, "a").unwrap_err();
    let multi = f
        .store
        .get_all(TABLE, &["a".to_string(), "b".to_string()])
        .unwrap_err();

    assert!(matches!(
        single,
        DataStoreError::SingleGetFailed {
            source: StoreError::Backend(_)
        }
    ));
    assert!(matches!(
        multi,
        DataStoreError::MultiGetFailed {
            source: StoreError::Backend(_)
        }
    ));
    assert_eq!(f.counters.acquired.load(Ordering::SeqCst), 2);
    assert_balanced(&f.counters);
}

#[test]
fn test_unknown_column_family_is_save_failure() {
    let counters = Arc::new(Counters::default());
    let provider = Arc::new(ScriptedProvider {
        backend: setup_backend(),
        faults: Faults::default(),
        counters: Arc::clone(&counters),
    });
    let config = Config::builder().column_family("missing").build();
    let store = DocumentStore::new(provider, Arc::new(JsonCodec), &config);

    let err = store.save(TABLE, &doc("a")).unwrap_err();

    assert!(matches!(
        err,
        DataStoreError::SingleSaveFailed {
            source: StoreError::ColumnFamilyNotFound(_)
        }
    ));
    assert_balanced(&counters);
}

// =============================================================================
// Close Failures
// =============================================================================

#[test]
fn test_close_failure_does_not_change_success() {
    let f = setup_scripted(Faults {
        close: true,
        ..Faults::default()
    });

    f.store.save(TABLE, &doc("a")).unwrap();
    let fetched = f.store.get(TABLE, "a").unwrap();

    assert_eq!(fetched, doc("a"));
    assert_eq!(f.counters.closed.load(Ordering::SeqCst), 2);
}

#[test]
fn test_close_failure_does_not_change_failure() {
    let f = setup_scripted(Faults {
        close: true,
        ..Faults::default()
    });

    let err = f.store.get(TABLE, "missing").unwrap_err();

    assert!(matches!(err, DataStoreError::NotFound { .. }));
    assert_balanced(&f.counters);
}

// =============================================================================
// Codec and Decode Failures
// =============================================================================

#[test]
fn test_encode_failure_acquires_nothing() {
    let counters = Arc::new(Counters::default());
    let provider = Arc::new(ScriptedProvider {
        backend: setup_backend(),
        faults: Faults::default(),
        counters: Arc::clone(&counters),
    });
    let store = DocumentStore::new(provider, Arc::new(BrokenCodec), &Config::default());

    let single = store.save(TABLE, &doc("a")).unwrap_err();
    let multi = store.save_all(TABLE, &[doc("a")]).unwrap_err();

    assert!(matches!(
        single,
        DataStoreError::SingleSaveFailed {
            source: StoreError::Serialization(_)
        }
    ));
    assert_eq!(multi.code(), ErrorCode::MultiSave);
    assert_eq!(counters.acquired.load(Ordering::SeqCst), 0);
}

#[test]
fn test_decode_failure_on_get() {
    let backend = setup_backend();
    let writer = setup_scripted_on(Arc::clone(&backend), Faults::default());
    writer.store.save(TABLE, &doc("a")).unwrap();

    let counters = Arc::new(Counters::default());
    let provider = Arc::new(ScriptedProvider {
        backend,
        faults: Faults::default(),
        counters,
    });
    let reader = DocumentStore::new(provider, Arc::new(BrokenCodec), &Config::default());

    assert_eq!(reader.get(TABLE, "a").unwrap_err().code(), ErrorCode::SingleGet);
    assert_eq!(
        reader.get_all(TABLE, &["a".to_string()]).unwrap_err().code(),
        ErrorCode::MultiGet
    );
}

#[test]
fn test_corrupted_timestamp_cell() {
    let f = setup_scripted(Faults::default());
    f.backend
        .put_batch(&[RowPut::new("a:events", "d")
            .add("data", b"{}".to_vec())
            .add("timestamp", vec![1u8, 2, 3])])
        .unwrap();

    let err = f.store.get(TABLE, "a").unwrap_err();

    assert!(matches!(
        err,
        DataStoreError::SingleGetFailed {
            source: StoreError::Corruption(_)
        }
    ));
}

#[test]
fn test_row_missing_data_cell() {
    let f = setup_scripted(Faults::default());
    f.backend
        .put_batch(&[RowPut::new("a:events", "d").add("timestamp", 5i64.to_be_bytes().to_vec())])
        .unwrap();

    let err = f.store.get_all(TABLE, &["a".to_string()]).unwrap_err();

    assert!(matches!(
        err,
        DataStoreError::MultiGetFailed {
            source: StoreError::Corruption(_)
        }
    ));
}

#[test]
fn test_missing_ids_reported_before_decode_errors() {
    let f = setup_scripted(Faults::default());
    f.backend
        .put_batch(&[RowPut::new("bad:events", "d")
            .add("data", b"not json".to_vec())
            .add("timestamp", 1i64.to_be_bytes().to_vec())])
        .unwrap();

    let err = f
        .store
        .get_all(TABLE, &["bad".to_string(), "gone".to_string()])
        .unwrap_err();

    assert!(matches!(err, DataStoreError::NotFoundForIds { ref ids } if ids == &["gone"]));
}
