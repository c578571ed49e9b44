//! Sparse time index over a per-store ledger.
//!
//! Samples the timestamp of every `G`-th entry (positions `0, G, 2G, ...`)
//! as entries are appended. A range query uses the samples to jump to the
//! granule holding its boundary and then scans at most `G + 1` entries.

use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};

/// Which boundary a lookup is searching for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// First entry with timestamp `>= t`.
    Inclusive,
    /// First entry with timestamp `> t`.
    Exclusive,
}

impl Bound {
    /// Whether a timestamp lies at or past the boundary for `t`.
    pub fn reached(self, timestamp: DateTime<Utc>, t: DateTime<Utc>) -> bool {
        match self {
            Bound::Inclusive => timestamp >= t,
            Bound::Exclusive => timestamp > t,
        }
    }
}

/// Timestamps sampled at every `granularity`-th ledger position.
///
/// Invariant: `samples[j]` is the timestamp of ledger entry `j * granularity`.
#[derive(Debug, Clone)]
pub struct SparseTimeIndex {
    granularity: NonZeroUsize,
    samples: Vec<DateTime<Utc>>,
}

impl SparseTimeIndex {
    pub fn new(granularity: NonZeroUsize) -> Self {
        Self {
            granularity,
            samples: Vec::new(),
        }
    }

    pub fn granularity(&self) -> usize {
        self.granularity.get()
    }

    /// Record `timestamp` if the entry about to be appended lands on a
    /// sampled position.
    ///
    /// `pre_insert_len` is the ledger length before the append.
    pub fn maybe_sample(&mut self, pre_insert_len: usize, timestamp: DateTime<Utc>) {
        if pre_insert_len % self.granularity() == 0 {
            debug_assert_eq!(self.samples.len(), pre_insert_len / self.granularity());
            self.samples.push(timestamp);
        }
    }

    /// Start offset of the granule holding the first entry that reaches `t`.
    ///
    /// Returns 0 when the index is empty or the first sample already reaches
    /// `t`. When no sample reaches `t`, returns the start of the final granule,
    /// since the target may still sit between the last sample and the tail.
    pub fn granule_start(&self, t: DateTime<Utc>, bound: Bound) -> usize {
        let first_reaching = self
            .samples
            .partition_point(|&sample| !bound.reached(sample, t));
        first_reaching.saturating_sub(1) * self.granularity()
    }

    #[cfg(test)]
    pub(crate) fn samples(&self) -> &[DateTime<Utc>] {
        &self.samples
    }
}
