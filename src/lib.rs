//! # AtlasDoc
//!
//! A document persistence layer over a column-family key-value store:
//! - Documents (id, timestamp, JSON payload) stored as rows keyed `{id}:{table}`
//! - Single and batch save/get with a typed error taxonomy
//! - One pooled table handle per call, released on every exit path
//! - In-memory and log-backed durable column-family backends
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Request Handlers                        │
//! │                  (consume `DataStore`)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    DocumentStore                            │
//! │        (validate, map rows, classify failures)              │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │                              │
//!            ▼                              ▼
//!   ┌─────────────────┐            ┌─────────────────┐
//!   │  PayloadCodec   │            │ HandleProvider  │
//!   │     (JSON)      │            │   (pooled)      │
//!   └─────────────────┘            └────────┬────────┘
//!                                           │
//!                                           ▼
//!                                  ┌─────────────────┐
//!                                  │  StoreBackend   │
//!                                  │ Memory / Log    │
//!                                  └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod document;
pub mod codec;
pub mod store;
pub mod datastore;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use codec::{JsonCodec, PayloadCodec};
pub use config::Config;
pub use datastore::{DataStore, DocumentStore};
pub use document::Document;
pub use error::{DataStoreError, ErrorCode, Result, StoreError, StoreResult};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of AtlasDoc
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
