//! Store with a single lock over every ledger.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, trace};

use super::sequence::StoreSequence;
use super::{read_lock, write_lock, LedgerError, SalesStorage};
use crate::config::DEFAULT_GRANULARITY;
use crate::domain::Sale;

/// In-memory sales store guarded by one read/write lock.
///
/// Appends take the lock exclusively; listings and range sums share it.
/// Ledgers are created lazily on a store's first sale.
pub struct IndexedSalesStore {
    granularity: NonZeroUsize,
    stores: RwLock<HashMap<String, StoreSequence>>,
}

impl IndexedSalesStore {
    pub fn new(granularity: NonZeroUsize) -> Self {
        Self {
            granularity,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Number of sales recorded for `store_id`.
    pub fn store_len(&self, store_id: &str) -> usize {
        read_lock(&self.stores)
            .get(store_id)
            .map_or(0, |seq| seq.entries().len())
    }

    /// Full-scan revenue over `[start, end]` for cross-checking.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn total_sum_naive(
        &self,
        store_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Decimal {
        read_lock(&self.stores)
            .get(store_id)
            .map_or(Decimal::ZERO, |seq| seq.total_sum_naive(start, end))
    }
}

impl Default for IndexedSalesStore {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_GRANULARITY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl SalesStorage for IndexedSalesStore {
    fn add_sale(&self, sale: Sale) -> Result<(), LedgerError> {
        let mut stores = write_lock(&self.stores);

        if let Some(seq) = stores.get_mut(&sale.store_id) {
            return seq.append(sale);
        }

        debug!(
            store_id = %sale.store_id,
            granularity = self.granularity.get(),
            "creating store ledger"
        );
        let store_id = sale.store_id.clone();
        let mut seq = StoreSequence::new(self.granularity);
        seq.append(sale)?;
        stores.insert(store_id, seq);
        Ok(())
    }

    fn get_sales(&self) -> Vec<Sale> {
        read_lock(&self.stores)
            .values()
            .flat_map(|seq| seq.sales().cloned())
            .collect()
    }

    fn get_total_sum(&self, store_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
        let stores = read_lock(&self.stores);
        let total = stores
            .get(store_id)
            .map_or(Decimal::ZERO, |seq| seq.total_sum(start, end));
        trace!(store_id, %start, %end, %total, "range sum");
        total
    }
}
