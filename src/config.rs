//! Configuration for AtlasDoc
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for an AtlasDoc store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the durable backend
    /// Internal structure:
    ///   {data_dir}/
    ///     └── documents.log    (append-only row log)
    pub data_dir: PathBuf,

    /// Sync strategy: how often to fsync the row log
    pub log_sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Row Layout
    // -------------------------------------------------------------------------
    /// Column family holding the `data` and `timestamp` columns
    pub column_family: String,

    /// Versions retained per cell by the backend (reads always ask for one)
    pub max_versions: usize,

    // -------------------------------------------------------------------------
    // Handle Pool
    // -------------------------------------------------------------------------
    /// Max table handles open at the same time
    pub max_open_handles: usize,

    /// How long `acquire` waits for a free handle (milliseconds)
    pub acquire_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Request Limits
    // -------------------------------------------------------------------------
    /// Max documents or ids accepted by a single batch call
    pub max_batch_size: usize,
}

/// Row log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced records (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./atlasdoc_data"),
            log_sync_strategy: SyncStrategy::EveryNEntries { count: 100 },
            column_family: "d".to_string(),
            max_versions: 3,
            max_open_handles: 64,
            acquire_timeout_ms: 5000,
            max_batch_size: 10_000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for the durable backend)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the row log sync strategy
    pub fn log_sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.log_sync_strategy = strategy;
        self
    }

    /// Set the column family name
    pub fn column_family(mut self, name: impl Into<String>) -> Self {
        self.config.column_family = name.into();
        self
    }

    /// Set the number of versions retained per cell (at least 1)
    pub fn max_versions(mut self, versions: usize) -> Self {
        self.config.max_versions = versions.max(1);
        self
    }

    /// Set the maximum number of concurrently open handles (at least 1)
    pub fn max_open_handles(mut self, count: usize) -> Self {
        self.config.max_open_handles = count.max(1);
        self
    }

    /// Set the handle acquire timeout (in milliseconds)
    pub fn acquire_timeout_ms(mut self, ms: u64) -> Self {
        self.config.acquire_timeout_ms = ms;
        self
    }

    /// Set the maximum batch size
    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.config.max_batch_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
