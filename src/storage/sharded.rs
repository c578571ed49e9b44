//! Store with one lock per store id.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, trace};

use super::sequence::StoreSequence;
use super::{read_lock, write_lock, LedgerError, SalesStorage};
use crate::domain::Sale;

type Shard = Arc<RwLock<StoreSequence>>;

/// In-memory sales store that locks each store's ledger independently.
///
/// The outer map lock is held only to find or create a shard. Writers to
/// different stores never contend; a listing reads shards one at a time, so
/// it is consistent per store but not across stores.
pub struct ShardedSalesStore {
    granularity: NonZeroUsize,
    shards: RwLock<HashMap<String, Shard>>,
}

impl ShardedSalesStore {
    pub fn new(granularity: NonZeroUsize) -> Self {
        Self {
            granularity,
            shards: RwLock::new(HashMap::new()),
        }
    }

    fn shard(&self, store_id: &str) -> Option<Shard> {
        read_lock(&self.shards).get(store_id).cloned()
    }

    fn shard_or_create(&self, store_id: &str) -> Shard {
        if let Some(shard) = self.shard(store_id) {
            return shard;
        }

        // Another writer may have created it between the two locks
        let mut shards = write_lock(&self.shards);
        let shard = shards.entry(store_id.to_string()).or_insert_with(|| {
            debug!(
                store_id,
                granularity = self.granularity.get(),
                "creating store shard"
            );
            Arc::new(RwLock::new(StoreSequence::new(self.granularity)))
        });
        Arc::clone(shard)
    }

    /// Full-scan revenue over `[start, end]` for cross-checking.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn total_sum_naive(
        &self,
        store_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Decimal {
        self.shard(store_id).map_or(Decimal::ZERO, |shard| {
            let seq = read_lock(&shard);
            seq.total_sum_naive(start, end)
        })
    }
}

impl SalesStorage for ShardedSalesStore {
    fn add_sale(&self, sale: Sale) -> Result<(), LedgerError> {
        let shard = self.shard_or_create(&sale.store_id);
        let mut seq = write_lock(&shard);
        seq.append(sale)
    }

    fn get_sales(&self) -> Vec<Sale> {
        let shards: Vec<Shard> = read_lock(&self.shards).values().cloned().collect();
        shards
            .iter()
            .flat_map(|shard| read_lock(shard).sales().cloned().collect::<Vec<_>>())
            .collect()
    }

    fn get_total_sum(&self, store_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
        let total = self.shard(store_id).map_or(Decimal::ZERO, |shard| {
            let seq = read_lock(&shard);
            seq.total_sum(start, end)
        });
        trace!(store_id, %start, %end, %total, "range sum");
        total
    }
}
