//! Storage implementations.
//!
//! Sales live in memory, one append-only ledger per store. Each ledger keeps
//! a running revenue total and a sparse time index, so a range-sum query
//! costs `O(G + log(n / G))` for granularity `G` instead of a full scan.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::config::{ConfigError, LockingMode, StorageConfig};
use crate::domain::Sale;

mod indexed;
mod sequence;
mod sharded;
mod sparse_index;


pub use indexed::IndexedSalesStore;
pub use sequence::{LedgerEntry, StoreSequence};
pub use sharded::ShardedSalesStore;
pub use sparse_index::{Bound, SparseTimeIndex};

/// Reasons a ledger refuses an append. A refused append leaves the ledger
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("revenue total for store {store_id} would overflow")]
    RevenueOverflow { store_id: String },
}

/// Interface for sale ingestion and range-sum queries.
///
/// Implementations:
/// - `IndexedSalesStore`: one lock over all stores
/// - `ShardedSalesStore`: one lock per store id
///
/// Only appends can fail, and only when the store's running revenue total
/// would overflow. Input validation belongs to
/// [`crate::service::SalesService`].
pub trait SalesStorage: Send + Sync {
    /// Record a sale in its store's ledger.
    ///
    /// Sales for the same store must arrive in non-decreasing `sale_date`
    /// order. Out-of-order sales trip a debug assertion and, in release
    /// builds, corrupt later range sums for that store.
    fn add_sale(&self, sale: Sale) -> Result<(), LedgerError>;

    /// Snapshot of every recorded sale. Per-store append order is kept;
    /// stores appear in no particular order.
    fn get_sales(&self) -> Vec<Sale>;

    /// Revenue for `store_id` over `[start, end]`, both ends inclusive.
    ///
    /// Zero for unknown stores, inverted ranges, and ranges outside the
    /// store's recorded history.
    fn get_total_sum(&self, store_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal;
}

/// Initialize storage based on configuration.
pub fn init_storage(config: &StorageConfig) -> Result<Arc<dyn SalesStorage>, ConfigError> {
    let granularity = config.granularity()?;
    info!(granularity = granularity.get(), locking = ?config.locking, "Storage: in-memory");

    let storage: Arc<dyn SalesStorage> = match config.locking {
        LockingMode::Global => Arc::new(IndexedSalesStore::new(granularity)),
        LockingMode::PerStore => Arc::new(ShardedSalesStore::new(granularity)),
    };
    Ok(storage)
}

// `StoreSequence::append` does every fallible step before it mutates, so
// data behind a poisoned lock is still consistent.
fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
