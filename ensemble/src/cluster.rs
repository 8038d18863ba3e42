//! Cluster view: which bookies are writable and which are read-only.
//!
//! The view is fed by the host's membership watcher through
//! [`ClusterView::on_cluster_changed`] and read by every placement call
//! through [`ClusterView::snapshot`].
//!
//! # Design
//!
//! - Every change builds a fresh [`ClusterSnapshot`] and swaps it in behind an
//!   `Arc`; readers clone the `Arc` once at call entry and keep a consistent
//!   view for the rest of the call, whatever happens to the cluster meanwhile.
//! - Snapshots are plain values, so tests construct arbitrary views directly
//!   with [`ClusterSnapshot::new`] without a live watcher.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::BookieAddress;

/// Monotonically increasing cluster view version.
///
/// Every call to [`ClusterView::on_cluster_changed`] bumps the version.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ClusterVersion(pub u64);

impl ClusterVersion {
    /// Return the next version.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for ClusterVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Immutable writable / read-only bookie sets at a specific version.
///
/// Invariant: no bookie is both writable and read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterSnapshot {
    writable: BTreeSet<BookieAddress>,
    read_only: BTreeSet<BookieAddress>,
    version: ClusterVersion,
}

impl ClusterSnapshot {
    /// Build a snapshot at version 0.
    ///
    /// A bookie listed in both sets is kept as read-only only.
    pub fn new(
        writable: impl IntoIterator<Item = BookieAddress>,
        read_only: impl IntoIterator<Item = BookieAddress>,
    ) -> Self {
        Self::build(writable, read_only, ClusterVersion::default())
    }

    fn build(
        writable: impl IntoIterator<Item = BookieAddress>,
        read_only: impl IntoIterator<Item = BookieAddress>,
        version: ClusterVersion,
    ) -> Self {
        let read_only: BTreeSet<BookieAddress> = read_only.into_iter().collect();
        let mut writable: BTreeSet<BookieAddress> = writable.into_iter().collect();

        let overlap = writable.intersection(&read_only).count();
        if overlap > 0 {
            warn!(
                overlap,
                version = %version,
                "Cluster change lists bookies as both writable and read-only, treating them as read-only"
            );
            writable.retain(|bookie| !read_only.contains(bookie));
        }

        Self {
            writable,
            read_only,
            version,
        }
    }

    /// Bookies accepting new writes, in canonical order.
    pub fn writable(&self) -> &BTreeSet<BookieAddress> {
        &self.writable
    }

    /// Degraded bookies: readable, never chosen for new writes.
    pub fn read_only(&self) -> &BTreeSet<BookieAddress> {
        &self.read_only
    }

    /// Version of this snapshot.
    pub fn version(&self) -> ClusterVersion {
        self.version
    }

    /// Whether the bookie accepts new writes.
    pub fn is_writable(&self, bookie: &BookieAddress) -> bool {
        self.writable.contains(bookie)
    }

    /// Whether the bookie is read-only.
    pub fn is_read_only(&self, bookie: &BookieAddress) -> bool {
        self.read_only.contains(bookie)
    }

    /// Whether the bookie is part of the cluster at all.
    pub fn contains(&self, bookie: &BookieAddress) -> bool {
        self.is_writable(bookie) || self.is_read_only(bookie)
    }

    /// Number of writable bookies.
    pub fn writable_count(&self) -> usize {
        self.writable.len()
    }

    /// Number of read-only bookies.
    pub fn read_only_count(&self) -> usize {
        self.read_only.len()
    }
}

/// Copy-on-write holder of the current [`ClusterSnapshot`].
///
/// Writes are expected from a single watcher path at a time; reads may come
/// from any number of threads.
#[derive(Debug, Default)]
pub struct ClusterView {
    current: RwLock<Arc<ClusterSnapshot>>,
}

impl ClusterView {
    /// Create an empty view (no bookies, version 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a view starting from an existing snapshot.
    pub fn from_snapshot(snapshot: ClusterSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The current snapshot. Never a live reference: later changes replace
    /// the view's snapshot and leave this one untouched.
    pub fn snapshot(&self) -> Arc<ClusterSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Replace the writable and read-only sets, returning the dead bookies.
    ///
    /// A bookie is dead when it was writable before and appears in neither
    /// new set. Moving from writable to read-only is not death. Replacing the
    /// dead bookies in existing ensembles is the caller's decision.
    pub fn on_cluster_changed(
        &self,
        writable: impl IntoIterator<Item = BookieAddress>,
        read_only: impl IntoIterator<Item = BookieAddress>,
    ) -> BTreeSet<BookieAddress> {
        let mut current = self.current.write();
        let next = ClusterSnapshot::build(writable, read_only, current.version.next());

        let dead: BTreeSet<BookieAddress> = current
            .writable
            .iter()
            .filter(|bookie| !next.contains(bookie))
            .cloned()
            .collect();

        if dead.is_empty() {
            debug!(
                version = %next.version,
                writable = next.writable_count(),
                read_only = next.read_only_count(),
                "Cluster changed"
            );
        } else {
            info!(
                version = %next.version,
                writable = next.writable_count(),
                read_only = next.read_only_count(),
                dead = ?dead,
                "Cluster changed, bookies left the cluster"
            );
        }

        *current = Arc::new(next);
        dead
    }
}
