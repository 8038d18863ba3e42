//! Read ordering: which replica of an entry to contact first.
//!
//! Bookies never observed failing are tried first, in write-set order. Bookies
//! with a recorded failure follow, the longest-ago failure first: a bookie
//! that failed an hour ago is a better bet than one that failed a second ago.
//!
//! ```text
//! write set:  [0, 1, 2]      history: b1 -> 100, b2 -> 50
//! read order: [0, 2, 1]
//! ```
//!
//! The orderer keeps no state and never touches the history it is given.

use crate::{BookieAddress, FailureHistory, WriteSet};

/// Orders write sets for reads by failure recency.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOrderer;

impl ReadOrderer {
    /// Create an orderer.
    pub fn new() -> Self {
        Self
    }

    /// Order in which to read an entry from the positions in `write_set`.
    ///
    /// The result is always a permutation of `write_set`; it is unchanged when
    /// no member of the write set has a recorded failure.
    pub fn reorder_read_sequence(
        &self,
        ensemble: &[BookieAddress],
        write_set: &[usize],
        failure_history: &FailureHistory,
    ) -> WriteSet {
        order_by_failure_recency(ensemble, write_set, failure_history)
    }

    /// Order in which to ask the write set for the last add confirmed.
    ///
    /// Same rule as [`reorder_read_sequence`](Self::reorder_read_sequence).
    pub fn reorder_read_lac_sequence(
        &self,
        ensemble: &[BookieAddress],
        write_set: &[usize],
        failure_history: &FailureHistory,
    ) -> WriteSet {
        order_by_failure_recency(ensemble, write_set, failure_history)
    }
}

fn order_by_failure_recency(
    ensemble: &[BookieAddress],
    write_set: &[usize],
    failure_history: &FailureHistory,
) -> WriteSet {
    if failure_history.is_empty() {
        return write_set.to_vec();
    }

    let mut healthy = Vec::with_capacity(write_set.len());
    let mut failed = Vec::new();
    for &position in write_set {
        // A position outside the ensemble has no address and so no failure record.
        match ensemble
            .get(position)
            .and_then(|bookie| failure_history.get(bookie))
        {
            Some(&failed_at) => failed.push((failed_at, position)),
            None => healthy.push(position),
        }
    }

    // Stable: equal timestamps keep write-set order.
    failed.sort_by_key(|&(failed_at, _)| failed_at);
    healthy.extend(failed.into_iter().map(|(_, position)| position));
    healthy
}
