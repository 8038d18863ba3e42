//! Placement statistics sink.
//!
//! The policy reports what it did to a [`PlacementStats`] implementation
//! supplied at initialization. Reporting is fire-and-forget: nothing a sink
//! does can influence a placement decision.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::PlacementError;

/// Receiver of placement counters and events.
///
/// Every method defaults to doing nothing, so sinks only override what they
/// care about.
pub trait PlacementStats: Send + Sync + std::fmt::Debug {
    /// A new ensemble of `ensemble_size` bookies was handed out.
    fn ensemble_created(&self, _ensemble_size: usize) {}

    /// A replacement bookie was handed out.
    fn bookie_replaced(&self) {}

    /// A placement was accepted although some window holds `achieved`
    /// bookies from one domain, above the `bound`.
    fn diversity_fallback(&self, _bound: usize, _achieved: usize) {}

    /// A placement or replacement call failed.
    fn placement_failed(&self, _error: &PlacementError) {}
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStats;

impl PlacementStats for NoopStats {}

/// Sink keeping relaxed atomic counters.
#[derive(Debug, Default)]
pub struct CountingStats {
    ensembles_created: AtomicU64,
    bookies_replaced: AtomicU64,
    diversity_fallbacks: AtomicU64,
    placement_failures: AtomicU64,
}

/// Snapshot of [`CountingStats`] for assertions and reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementStatsSnapshot {
    /// Ensembles handed out.
    pub ensembles_created: u64,
    /// Replacement bookies handed out.
    pub bookies_replaced: u64,
    /// Placements accepted below the diversity bound.
    pub diversity_fallbacks: u64,
    /// Failed placement or replacement calls.
    pub placement_failures: u64,
}

impl CountingStats {
    /// Create a sink with every counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the current counter values.
    pub fn snapshot(&self) -> PlacementStatsSnapshot {
        PlacementStatsSnapshot {
            ensembles_created: self.ensembles_created.load(Ordering::Relaxed),
            bookies_replaced: self.bookies_replaced.load(Ordering::Relaxed),
            diversity_fallbacks: self.diversity_fallbacks.load(Ordering::Relaxed),
            placement_failures: self.placement_failures.load(Ordering::Relaxed),
        }
    }
}

impl PlacementStats for CountingStats {
    fn ensemble_created(&self, _ensemble_size: usize) {
        self.ensembles_created.fetch_add(1, Ordering::Relaxed);
    }

    fn bookie_replaced(&self) {
        self.bookies_replaced.fetch_add(1, Ordering::Relaxed);
    }

    fn diversity_fallback(&self, _bound: usize, _achieved: usize) {
        self.diversity_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    fn placement_failed(&self, _error: &PlacementError) {
        self.placement_failures.fetch_add(1, Ordering::Relaxed);
    }
}
