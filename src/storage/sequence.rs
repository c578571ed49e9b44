//! Per-store append-only ledger with running revenue totals.

use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::sparse_index::{Bound, SparseTimeIndex};
use super::LedgerError;
use crate::domain::Sale;

/// A recorded sale plus the store's revenue total through this entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub sale: Sale,
    pub cumulative_sum: Decimal,
}

/// Ordered ledger of one store's sales and the sparse index over it.
///
/// Entries must be appended in non-decreasing `sale_date` order. Debug
/// builds assert this on every append; release builds trust the caller and
/// return wrong range sums if it is violated.
#[derive(Debug, Clone)]
pub struct StoreSequence {
    entries: Vec<LedgerEntry>,
    index: SparseTimeIndex,
}

impl StoreSequence {
    pub fn new(granularity: NonZeroUsize) -> Self {
        Self {
            entries: Vec::new(),
            index: SparseTimeIndex::new(granularity),
        }
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn sales(&self) -> impl Iterator<Item = &Sale> {
        self.entries.iter().map(|entry| &entry.sale)
    }

    /// Append a sale, extending the running total and the sparse index.
    ///
    /// Fails without touching the ledger if the running total would overflow.
    pub fn append(&mut self, sale: Sale) -> Result<(), LedgerError> {
        if let Some(tail) = self.entries.last() {
            debug_assert!(
                tail.sale.sale_date <= sale.sale_date,
                "sale for store {} at {} precedes ledger tail at {}",
                sale.store_id,
                sale.sale_date,
                tail.sale.sale_date
            );
        }

        let previous = self
            .entries
            .last()
            .map_or(Decimal::ZERO, |tail| tail.cumulative_sum);
        let cumulative_sum = sale
            .checked_revenue()
            .and_then(|revenue| previous.checked_add(revenue))
            .ok_or_else(|| LedgerError::RevenueOverflow {
                store_id: sale.store_id.clone(),
            })?;

        self.index.maybe_sample(self.entries.len(), sale.sale_date);
        self.entries.push(LedgerEntry {
            sale,
            cumulative_sum,
        });
        Ok(())
    }

    /// Offset of the first entry reaching `t` under `bound`, or `None` when
    /// every entry precedes it.
    pub fn boundary_index(&self, t: DateTime<Utc>, bound: Bound) -> Option<usize> {
        let start = self.index.granule_start(t, bound);
        let window = self.index.granularity() + 1;

        self.entries
            .iter()
            .enumerate()
            .skip(start)
            .take(window)
            .find(|(_, entry)| bound.reached(entry.sale.sale_date, t))
            .map(|(offset, _)| offset)
    }

    /// Revenue of all entries with `start <= sale_date <= end`.
    ///
    /// Returns zero for an inverted range or a range that misses the ledger.
    pub fn total_sum(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
        if start > end {
            return Decimal::ZERO;
        }
        let (Some(head), Some(tail)) = (self.entries.first(), self.entries.last()) else {
            return Decimal::ZERO;
        };
        if start > tail.sale.sale_date || end < head.sale.sale_date {
            return Decimal::ZERO;
        }

        let Some(first) = self.boundary_index(start, Bound::Inclusive) else {
            return Decimal::ZERO;
        };
        let past_end = self
            .boundary_index(end, Bound::Exclusive)
            .unwrap_or(self.entries.len());

        // [start, end] falls in a gap between two entries
        if past_end <= first {
            return Decimal::ZERO;
        }

        let sum_through_end = self.entries[past_end - 1].cumulative_sum;
        let sum_before_start = match first {
            0 => Decimal::ZERO,
            n => self.entries[n - 1].cumulative_sum,
        };
        sum_through_end - sum_before_start
    }

    /// Reference full-scan sum used to cross-check [`Self::total_sum`].
    #[cfg(any(test, feature = "test-utils"))]
    pub fn total_sum_naive(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
        self.entries
            .iter()
            .filter(|entry| (start..=end).contains(&entry.sale.sale_date))
            .map(|entry| entry.sale.revenue())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn sale(secs: i64, quantity_sold: i64, sale_price: Decimal) -> Sale {
        Sale {
            product_id: format!("product_{secs}"),
            store_id: "store_1".to_string(),
            quantity_sold,
            sale_price,
            sale_date: ts(secs),
        }
    }

    fn sequence(granularity: usize, sales: impl IntoIterator<Item = Sale>) -> StoreSequence {
        let mut seq = StoreSequence::new(NonZeroUsize::new(granularity).unwrap());
        for s in sales {
            seq.append(s).unwrap();
        }
        seq
    }

    #[test]
    fn test_append_tracks_cumulative_sum() {
        let seq = sequence(
            2,
            [
                sale(0, 2, dec!(1.50)),
                sale(1, 1, dec!(0.25)),
                sale(2, 3, dec!(10)),
            ],
        );

        let sums: Vec<_> = seq.entries().iter().map(|e| e.cumulative_sum).collect();
        assert_eq!(sums, vec![dec!(3.00), dec!(3.25), dec!(33.25)]);
    }

    #[test]
    fn test_append_samples_index() {
        let seq = sequence(2, (0..5).map(|i| sale(i, 1, dec!(1))));
        assert_eq!(seq.index.samples().len(), 3);
    }

    #[test]
    fn test_boundary_index_finds_first_reaching_entry() {
        let seq = sequence(3, (0..10).map(|i| sale(i * 10, 1, dec!(1))));

        assert_eq!(seq.boundary_index(ts(-5), Bound::Inclusive), Some(0));
        assert_eq!(seq.boundary_index(ts(30), Bound::Inclusive), Some(3));
        assert_eq!(seq.boundary_index(ts(30), Bound::Exclusive), Some(4));
        assert_eq!(seq.boundary_index(ts(35), Bound::Inclusive), Some(4));
        assert_eq!(seq.boundary_index(ts(90), Bound::Inclusive), Some(9));
        assert_eq!(seq.boundary_index(ts(90), Bound::Exclusive), None);
        assert_eq!(seq.boundary_index(ts(91), Bound::Inclusive), None);
    }

    #[test]
    fn test_boundary_index_on_empty_sequence() {
        let seq = sequence(10, Vec::new());
        assert_eq!(seq.boundary_index(ts(0), Bound::Inclusive), None);
    }

    #[test]
    fn test_total_sum_includes_both_boundaries() {
        let seq = sequence(2, (0..6).map(|i| sale(i * 10, 1, Decimal::from(i + 1))));

        assert_eq!(seq.total_sum(ts(10), ts(30)), dec!(9));
        assert_eq!(seq.total_sum(ts(0), ts(0)), dec!(1));
        assert_eq!(seq.total_sum(ts(50), ts(50)), dec!(6));
    }

    #[test]
    fn test_total_sum_end_between_entries() {
        let seq = sequence(2, (0..6).map(|i| sale(i * 10, 1, Decimal::from(i + 1))));
        assert_eq!(seq.total_sum(ts(0), ts(25)), dec!(6));
    }

    #[test]
    fn test_total_sum_range_in_gap() {
        let seq = sequence(2, (0..6).map(|i| sale(i * 10, 1, Decimal::from(i + 1))));
        assert_eq!(seq.total_sum(ts(11), ts(19)), Decimal::ZERO);
    }

    #[test]
    fn test_total_sum_empty_policies() {
        let seq = sequence(2, (0..6).map(|i| sale(i * 10, 1, dec!(1))));

        assert_eq!(seq.total_sum(ts(30), ts(20)), Decimal::ZERO);
        assert_eq!(seq.total_sum(ts(51), ts(60)), Decimal::ZERO);
        assert_eq!(seq.total_sum(ts(-10), ts(-1)), Decimal::ZERO);
        assert_eq!(sequence(2, Vec::new()).total_sum(ts(0), ts(60)), Decimal::ZERO);
    }

    #[test]
    fn test_total_sum_duplicate_timestamps_across_granules() {
        let seq = sequence(
            2,
            [
                sale(0, 1, dec!(1)),
                sale(10, 1, dec!(2)),
                sale(10, 1, dec!(4)),
                sale(10, 1, dec!(8)),
                sale(20, 1, dec!(16)),
            ],
        );

        assert_eq!(seq.total_sum(ts(10), ts(10)), dec!(14));
        assert_eq!(seq.total_sum(ts(5), ts(15)), dec!(14));
        assert_eq!(seq.total_sum(ts(10), ts(20)), dec!(30));
    }

    #[test]
    fn test_overflowing_sale_leaves_ledger_untouched() {
        let mut seq = sequence(2, [sale(0, 1, dec!(1)), sale(1, 1, dec!(2))]);

        let huge = sale(2, i64::MAX, Decimal::from(1_000_000_000_000i64));
        assert_eq!(
            seq.append(huge),
            Err(LedgerError::RevenueOverflow {
                store_id: "store_1".to_string()
            })
        );
        assert_eq!(seq.entries().len(), 2);
        assert_eq!(seq.index.samples().len(), 1);

        // position 2 is sampled by the next successful append
        seq.append(sale(3, 1, dec!(4))).unwrap();
        seq.append(sale(4, 1, dec!(8))).unwrap();
        assert_eq!(seq.index.samples(), &[ts(0), ts(3)]);
        assert_eq!(seq.total_sum(ts(0), ts(4)), dec!(15));
        assert_eq!(seq.total_sum(ts(2), ts(3)), dec!(4));
    }

    #[test]
    fn test_running_total_overflow_rejected() {
        let mut seq = sequence(2, [sale(0, 1, Decimal::MAX)]);
        assert!(seq.append(sale(1, 1, Decimal::MAX)).is_err());
        assert_eq!(seq.entries().len(), 1);
        assert_eq!(seq.total_sum(ts(0), ts(1)), Decimal::MAX);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "precedes ledger tail")]
    fn test_out_of_order_append_asserts_in_debug() {
        sequence(2, [sale(10, 1, dec!(1)), sale(5, 1, dec!(1))]);
    }

    fn arb_sales() -> impl Strategy<Value = Vec<Sale>> {
        prop::collection::vec((0i64..4, 1i64..50, 1i64..100_000), 0..120).prop_map(|rows| {
            let mut clock = 0;
            rows.into_iter()
                .map(|(step, qty, cents)| {
                    clock += step;
                    sale(clock, qty, Decimal::new(cents, 2))
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_cumulative_invariant(sales in arb_sales(), granularity in 1usize..16) {
            let seq = sequence(granularity, sales);
            let mut previous = Decimal::ZERO;
            for entry in seq.entries() {
                prop_assert_eq!(entry.cumulative_sum, previous + entry.sale.revenue());
                previous = entry.cumulative_sum;
            }
        }

        #[test]
        fn prop_index_samples_match_positions(sales in arb_sales(), granularity in 1usize..16) {
            let seq = sequence(granularity, sales);
            prop_assert_eq!(
                seq.index.samples().len(),
                seq.entries().len().div_ceil(granularity)
            );
            for (j, sample) in seq.index.samples().iter().enumerate() {
                prop_assert_eq!(*sample, seq.entries()[j * granularity].sale.sale_date);
            }
        }

        #[test]
        fn prop_total_sum_matches_naive(
            sales in arb_sales(),
            granularity in 1usize..16,
            start in -5i64..500,
            end in -5i64..500,
        ) {
            let seq = sequence(granularity, sales);
            prop_assert_eq!(
                seq.total_sum(ts(start), ts(end)),
                seq.total_sum_naive(ts(start), ts(end))
            );
        }
    }
}
