//! Storage configuration types.

use std::num::NonZeroUsize;

use serde::Deserialize;

use super::ConfigError;

/// Default number of ledger entries per sparse index sample.
pub const DEFAULT_GRANULARITY: usize = 10;

/// Lock layout for the in-memory store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockingMode {
    /// One read/write lock over every store's ledger.
    #[default]
    Global,
    /// One read/write lock per store id.
    PerStore,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Ledger entries between consecutive sparse index samples.
    /// Trades memory for query latency; must be at least 1.
    /// Default: 10
    pub granularity: usize,
    /// Lock layout.
    pub locking: LockingMode,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            granularity: DEFAULT_GRANULARITY,
            locking: LockingMode::Global,
        }
    }
}

impl StorageConfig {
    /// Granularity as the non-zero value the storage layer requires.
    pub fn granularity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.granularity).ok_or(ConfigError::InvalidGranularity)
    }
}
