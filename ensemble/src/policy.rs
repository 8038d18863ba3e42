//! The placement policy facade.
//!
//! [`EnsemblePlacementPolicy`] owns the lifecycle and wires the cluster view,
//! placement engine, read orderer, topology resolver and stats sink together.
//!
//! ```text
//!  Uninitialized ──initialize──▶ Active ──uninitialize──▶ TornDown
//! ```
//!
//! Every operation takes a shared reference to the active state at entry and
//! releases the lifecycle lock before computing, so placement calls never
//! contend with each other and never hold a lock across selection.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::cluster::{ClusterSnapshot, ClusterView};
use crate::config::PlacementConfig;
use crate::placement::PlacementEngine;
use crate::read_order::ReadOrderer;
use crate::stats::PlacementStats;
use crate::{
    BookieAddress, FailureHistory, PlacementError, PlacementResult, PolicyState, QuorumSpec,
    RandomProvider, TopologyResolver, WriteSet,
};

#[derive(Debug)]
struct ActivePolicy {
    config: PlacementConfig,
    engine: PlacementEngine,
    cluster: ClusterView,
    resolver: Arc<dyn TopologyResolver>,
    stats: Arc<dyn PlacementStats>,
    random: Arc<dyn RandomProvider>,
    orderer: ReadOrderer,
}

#[derive(Debug)]
enum PolicyInner {
    Uninitialized,
    Active(Arc<ActivePolicy>),
    TornDown,
}

impl PolicyInner {
    fn state(&self) -> PolicyState {
        match self {
            Self::Uninitialized => PolicyState::Uninitialized,
            Self::Active(_) => PolicyState::Active,
            Self::TornDown => PolicyState::TornDown,
        }
    }
}

/// Rack/region-aware ensemble placement policy for one ledger client.
///
/// Safe to share between threads; all operations take `&self`.
#[derive(Debug)]
pub struct EnsemblePlacementPolicy {
    inner: RwLock<PolicyInner>,
}

impl Default for EnsemblePlacementPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl EnsemblePlacementPolicy {
    /// Create an uninitialized policy.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(PolicyInner::Uninitialized),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PolicyState {
        self.inner.read().state()
    }

    /// Activate the policy, drawing randomness as `config.random_seed` asks.
    ///
    /// The cluster starts empty until the first
    /// [`on_cluster_changed`](Self::on_cluster_changed). A
    /// `placement_attempts` of zero is treated as one.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::InvalidLifecycle`] unless the policy is
    /// uninitialized.
    pub fn initialize(
        &self,
        config: PlacementConfig,
        resolver: Arc<dyn TopologyResolver>,
        stats: Arc<dyn PlacementStats>,
    ) -> PlacementResult<()> {
        let random = config.random_provider();
        self.initialize_with_random(config, resolver, stats, random)
    }

    /// Activate the policy with an explicit random provider.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::InvalidLifecycle`] unless the policy is
    /// uninitialized.
    pub fn initialize_with_random(
        &self,
        config: PlacementConfig,
        resolver: Arc<dyn TopologyResolver>,
        stats: Arc<dyn PlacementStats>,
        random: Arc<dyn RandomProvider>,
    ) -> PlacementResult<()> {
        let mut inner = self.inner.write();
        if !matches!(*inner, PolicyInner::Uninitialized) {
            return Err(PlacementError::InvalidLifecycle {
                from: inner.state(),
                to: PolicyState::Active,
            });
        }

        let engine = PlacementEngine::new(config.algorithm, config.diversity_mode)
            .with_attempts(config.placement_attempts);
        info!(
            algorithm = %config.algorithm,
            diversity_mode = ?config.diversity_mode,
            placement_attempts = config.placement_attempts,
            seeded = config.random_seed.is_some(),
            "Placement policy initialized"
        );

        *inner = PolicyInner::Active(Arc::new(ActivePolicy {
            config,
            engine,
            cluster: ClusterView::new(),
            resolver,
            stats,
            random,
            orderer: ReadOrderer::new(),
        }));
        Ok(())
    }

    /// Tear the policy down. Every later operation fails with
    /// [`PlacementError::PolicyNotActive`].
    ///
    /// Calls already in flight finish against the state they started with.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::InvalidLifecycle`] unless the policy is active.
    pub fn uninitialize(&self) -> PlacementResult<()> {
        let mut inner = self.inner.write();
        if !matches!(*inner, PolicyInner::Active(_)) {
            return Err(PlacementError::InvalidLifecycle {
                from: inner.state(),
                to: PolicyState::TornDown,
            });
        }
        *inner = PolicyInner::TornDown;
        info!("Placement policy torn down");
        Ok(())
    }

    /// The configuration the policy was initialized with.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::PolicyNotActive`] outside the active state.
    pub fn config(&self) -> PlacementResult<PlacementConfig> {
        Ok(self.active()?.config.clone())
    }

    /// Replace the known cluster membership and return the bookies that left.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::PolicyNotActive`] outside the active state.
    pub fn on_cluster_changed(
        &self,
        writable: impl IntoIterator<Item = BookieAddress>,
        read_only: impl IntoIterator<Item = BookieAddress>,
    ) -> PlacementResult<BTreeSet<BookieAddress>> {
        Ok(self.active()?.cluster.on_cluster_changed(writable, read_only))
    }

    /// The cluster membership placement currently works from.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::PolicyNotActive`] outside the active state.
    pub fn cluster_snapshot(&self) -> PlacementResult<Arc<ClusterSnapshot>> {
        Ok(self.active()?.cluster.snapshot())
    }

    /// Choose `ensemble_size` distinct writable bookies for a new ledger.
    ///
    /// # Errors
    ///
    /// - [`PlacementError::PolicyNotActive`] outside the active state.
    /// - [`PlacementError::InvalidQuorumConfig`] for inconsistent sizes.
    /// - [`PlacementError::NotEnoughBookies`] if the pool is too small.
    /// - [`PlacementError::DiversityConstraintUnsatisfiable`] in strict mode.
    pub fn new_ensemble(
        &self,
        ensemble_size: usize,
        write_quorum_size: usize,
        ack_quorum_size: usize,
        exclude: &HashSet<BookieAddress>,
    ) -> PlacementResult<Vec<BookieAddress>> {
        let active = self.active()?;
        let result = QuorumSpec::new(ensemble_size, write_quorum_size, ack_quorum_size)
            .and_then(|quorum| {
                let snapshot = active.cluster.snapshot();
                let mut rng = active.random.generator();
                active.engine.new_ensemble(
                    &snapshot,
                    active.resolver.as_ref(),
                    quorum,
                    exclude,
                    &mut rng,
                )
            });

        match result {
            Ok(placement) => {
                if !placement.meets_bound() {
                    warn!(
                        bound = placement.bound,
                        achieved = placement.max_domain_load,
                        ensemble = ?placement.ensemble,
                        "Ensemble accepted below the diversity bound"
                    );
                    active
                        .stats
                        .diversity_fallback(placement.bound, placement.max_domain_load);
                }
                active.stats.ensemble_created(placement.ensemble.len());
                Ok(placement.ensemble)
            }
            Err(error) => {
                active.stats.placement_failed(&error);
                Err(error)
            }
        }
    }

    /// Choose a writable bookie to take `bookie_to_replace`'s position in
    /// `current_ensemble`.
    ///
    /// # Errors
    ///
    /// - [`PlacementError::PolicyNotActive`] outside the active state.
    /// - [`PlacementError::InvalidQuorumConfig`] for inconsistent sizes.
    /// - [`PlacementError::InvalidEnsemble`] or
    ///   [`PlacementError::BookieNotInEnsemble`] for a malformed request.
    /// - [`PlacementError::NotEnoughBookies`] if no candidate is left.
    /// - [`PlacementError::DiversityConstraintUnsatisfiable`] in strict mode.
    pub fn replace_bookie(
        &self,
        ensemble_size: usize,
        write_quorum_size: usize,
        ack_quorum_size: usize,
        current_ensemble: &[BookieAddress],
        bookie_to_replace: &BookieAddress,
        exclude: &HashSet<BookieAddress>,
    ) -> PlacementResult<BookieAddress> {
        let active = self.active()?;
        let result = QuorumSpec::new(ensemble_size, write_quorum_size, ack_quorum_size)
            .and_then(|quorum| {
                let snapshot = active.cluster.snapshot();
                let mut rng = active.random.generator();
                active.engine.replace_bookie(
                    &snapshot,
                    active.resolver.as_ref(),
                    quorum,
                    current_ensemble,
                    bookie_to_replace,
                    exclude,
                    &mut rng,
                )
            });

        match result {
            Ok(replacement) => {
                if !replacement.meets_bound() {
                    warn!(
                        bound = replacement.bound,
                        achieved = replacement.domain_load,
                        replacement = %replacement.bookie,
                        "Replacement accepted below the diversity bound"
                    );
                    active
                        .stats
                        .diversity_fallback(replacement.bound, replacement.domain_load);
                }
                active.stats.bookie_replaced();
                Ok(replacement.bookie)
            }
            Err(error) => {
                active.stats.placement_failed(&error);
                Err(error)
            }
        }
    }

    /// Order in which to read an entry from its write set.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::PolicyNotActive`] outside the active state.
    pub fn reorder_read_sequence(
        &self,
        ensemble: &[BookieAddress],
        write_set: &[usize],
        failure_history: &FailureHistory,
    ) -> PlacementResult<WriteSet> {
        let active = self.active()?;
        Ok(active
            .orderer
            .reorder_read_sequence(ensemble, write_set, failure_history))
    }

    /// Order in which to ask the write set for the last add confirmed.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::PolicyNotActive`] outside the active state.
    pub fn reorder_read_lac_sequence(
        &self,
        ensemble: &[BookieAddress],
        write_set: &[usize],
        failure_history: &FailureHistory,
    ) -> PlacementResult<WriteSet> {
        let active = self.active()?;
        Ok(active
            .orderer
            .reorder_read_lac_sequence(ensemble, write_set, failure_history))
    }

    fn active(&self) -> PlacementResult<Arc<ActivePolicy>> {
        match &*self.inner.read() {
            PolicyInner::Active(active) => Ok(Arc::clone(active)),
            other => Err(PlacementError::PolicyNotActive {
                state: other.state(),
            }),
        }
    }
}
