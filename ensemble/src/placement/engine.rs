//! Ensemble selection and single-bookie replacement.
//!
//! # Diversity bound
//!
//! For every wrapping window of `write_quorum_size` consecutive positions, no
//! domain may hold more than [`QuorumSpec::max_per_domain`] bookies. Losing a
//! whole domain then never costs a window its ack quorum.
//!
//! # Selection
//!
//! Positions are filled left to right. Each remaining candidate is scored by
//!
//! 1. the worst count its domain would reach in any window covering the
//!    position (lower is better),
//! 2. how many pool bookies are left in its domain (more is better, so scarce
//!    domains stay available for later positions),
//!
//! and the winner is drawn uniformly among the candidates sharing the best
//! score. A pass that misses the bound is retried with fresh randomness up to
//! the configured number of attempts.
//!
//! Greedy passes can paint themselves into a corner on uneven pools. When
//! every pass misses the bound, a backtracking search over domains looks for
//! a placement at each load from the bound up to the best pass's load, so the
//! returned placement always has the lowest achievable worst-window load and
//! strict mode only fails when the bound is out of reach.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::algorithm::{DomainKey, PlacementAlgorithm};
use crate::cluster::ClusterSnapshot;
use crate::config::{DiversityMode, DEFAULT_PLACEMENT_ATTEMPTS};
use crate::{BookieAddress, PlacementError, PlacementRng, QuorumSpec, TopologyResolver};

/// A freshly selected ensemble and how diverse it turned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsemblePlacement {
    /// The selected bookies; position is significant.
    pub ensemble: Vec<BookieAddress>,
    /// Worst per-domain count over all write-quorum windows.
    pub max_domain_load: usize,
    /// The per-domain bound the placement aimed for.
    pub bound: usize,
}

impl EnsemblePlacement {
    /// Whether every window respects the per-domain bound.
    pub fn meets_bound(&self) -> bool {
        self.max_domain_load <= self.bound
    }
}

/// A replacement bookie and its effect on diversity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// The bookie that takes over the replaced position.
    pub bookie: BookieAddress,
    /// Worst per-domain count over the windows covering the replaced position.
    pub domain_load: usize,
    /// The per-domain bound the replacement aimed for.
    pub bound: usize,
}

impl Replacement {
    /// Whether the windows covering the replaced position respect the bound.
    pub fn meets_bound(&self) -> bool {
        self.domain_load <= self.bound
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    bookie: BookieAddress,
    domain: DomainKey,
}

/// Stateless selection logic; every call works on the snapshot it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementEngine {
    algorithm: PlacementAlgorithm,
    diversity_mode: DiversityMode,
    attempts: usize,
}

impl PlacementEngine {
    /// Create an engine for the given algorithm and diversity mode.
    pub fn new(algorithm: PlacementAlgorithm, diversity_mode: DiversityMode) -> Self {
        Self {
            algorithm,
            diversity_mode,
            attempts: DEFAULT_PLACEMENT_ATTEMPTS,
        }
    }

    /// Set how many selection passes `new_ensemble` may run (at least one).
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// The algorithm mapping bookies to domains.
    pub fn algorithm(&self) -> PlacementAlgorithm {
        self.algorithm
    }

    /// Whether an unmet diversity bound fails the call.
    pub fn diversity_mode(&self) -> DiversityMode {
        self.diversity_mode
    }

    /// Select `quorum.ensemble_size()` distinct writable bookies, none of them
    /// in `exclude`.
    ///
    /// # Errors
    ///
    /// - [`PlacementError::NotEnoughBookies`] if the pool is too small.
    /// - [`PlacementError::DiversityConstraintUnsatisfiable`] in strict mode
    ///   when no pass met the bound.
    pub fn new_ensemble(
        &self,
        snapshot: &ClusterSnapshot,
        resolver: &dyn TopologyResolver,
        quorum: QuorumSpec,
        exclude: &HashSet<BookieAddress>,
        rng: &mut PlacementRng,
    ) -> Result<EnsemblePlacement, PlacementError> {
        let pool: Vec<Candidate> = snapshot
            .writable()
            .iter()
            .filter(|bookie| !exclude.contains(*bookie))
            .map(|bookie| self.candidate(bookie, resolver))
            .collect();

        if pool.len() < quorum.ensemble_size() {
            return Err(PlacementError::NotEnoughBookies {
                required: quorum.ensemble_size(),
                available: pool.len(),
            });
        }

        let bound = quorum.max_per_domain();
        let mut best = fill_positions(&pool, quorum, rng);
        let mut best_load = max_window_load(&best, quorum);
        let mut passes = 1;
        while best_load > bound && passes < self.attempts {
            let next = fill_positions(&pool, quorum, rng);
            let load = max_window_load(&next, quorum);
            if load < best_load {
                best = next;
                best_load = load;
            }
            passes += 1;
        }

        let searched = best_load > bound;
        if searched {
            for limit in bound..best_load {
                if let Some(found) = search_positions(&pool, quorum, limit, rng) {
                    best_load = max_window_load(&found, quorum);
                    best = found;
                    break;
                }
            }
        }

        if best_load > bound && self.diversity_mode == DiversityMode::Strict {
            return Err(PlacementError::DiversityConstraintUnsatisfiable {
                bound,
                achieved: best_load,
            });
        }

        let ensemble: Vec<BookieAddress> = best.iter().map(|c| c.bookie.clone()).collect();
        debug!(
            algorithm = %self.algorithm,
            quorum = %quorum,
            version = %snapshot.version(),
            passes,
            searched,
            max_domain_load = best_load,
            bound,
            ensemble = ?ensemble,
            "Placement: new ensemble selected"
        );

        Ok(EnsemblePlacement {
            ensemble,
            max_domain_load: best_load,
            bound,
        })
    }

    /// Select a writable bookie to take `bookie_to_replace`'s position.
    ///
    /// Every other member keeps its position. The candidate pool excludes the
    /// whole current ensemble and `exclude`.
    ///
    /// # Errors
    ///
    /// - [`PlacementError::InvalidEnsemble`] if `current` has the wrong size or
    ///   duplicate members.
    /// - [`PlacementError::BookieNotInEnsemble`] if the target is not a member.
    /// - [`PlacementError::NotEnoughBookies`] if no candidate is left.
    /// - [`PlacementError::DiversityConstraintUnsatisfiable`] in strict mode
    ///   when every candidate breaks the bound.
    #[allow(clippy::too_many_arguments)]
    pub fn replace_bookie(
        &self,
        snapshot: &ClusterSnapshot,
        resolver: &dyn TopologyResolver,
        quorum: QuorumSpec,
        current: &[BookieAddress],
        bookie_to_replace: &BookieAddress,
        exclude: &HashSet<BookieAddress>,
        rng: &mut PlacementRng,
    ) -> Result<Replacement, PlacementError> {
        if current.len() != quorum.ensemble_size() {
            return Err(PlacementError::InvalidEnsemble {
                reason: format!(
                    "ensemble has {} bookies, expected {}",
                    current.len(),
                    quorum.ensemble_size()
                ),
            });
        }
        let members: HashSet<&BookieAddress> = current.iter().collect();
        if members.len() != current.len() {
            return Err(PlacementError::InvalidEnsemble {
                reason: "ensemble contains duplicate bookies".to_string(),
            });
        }
        let position = current
            .iter()
            .position(|bookie| bookie == bookie_to_replace)
            .ok_or_else(|| PlacementError::BookieNotInEnsemble {
                bookie: bookie_to_replace.clone(),
            })?;

        let pool: Vec<Candidate> = snapshot
            .writable()
            .iter()
            .filter(|bookie| !members.contains(bookie) && !exclude.contains(*bookie))
            .map(|bookie| self.candidate(bookie, resolver))
            .collect();
        if pool.is_empty() {
            return Err(PlacementError::NotEnoughBookies {
                required: 1,
                available: 0,
            });
        }

        let current_candidates: Vec<Candidate> = current
            .iter()
            .map(|bookie| self.candidate(bookie, resolver))
            .collect();
        let domains: Vec<&DomainKey> = current_candidates.iter().map(|c| &c.domain).collect();

        let scores: Vec<(usize, usize)> = pool
            .iter()
            .map(|candidate| {
                (
                    window_cost(&domains, position, &candidate.domain, quorum),
                    ensemble_share(&domains, position, &candidate.domain),
                )
            })
            .collect();
        let pick = pick_best(&scores, rng).ok_or(PlacementError::NotEnoughBookies {
            required: 1,
            available: 0,
        })?;
        let (domain_load, _) = scores[pick];

        let bound = quorum.max_per_domain();
        if domain_load > bound && self.diversity_mode == DiversityMode::Strict {
            return Err(PlacementError::DiversityConstraintUnsatisfiable {
                bound,
                achieved: domain_load,
            });
        }

        let bookie = pool[pick].bookie.clone();
        debug!(
            algorithm = %self.algorithm,
            quorum = %quorum,
            version = %snapshot.version(),
            replaced = %bookie_to_replace,
            replacement = %bookie,
            position,
            domain_load,
            bound,
            "Placement: replacement bookie selected"
        );

        Ok(Replacement {
            bookie,
            domain_load,
            bound,
        })
    }

    fn candidate(&self, bookie: &BookieAddress, resolver: &dyn TopologyResolver) -> Candidate {
        Candidate {
            bookie: bookie.clone(),
            domain: self.algorithm.domain_key(bookie, resolver),
        }
    }
}

/// One greedy pass over every ensemble position.
fn fill_positions<'p>(
    pool: &'p [Candidate],
    quorum: QuorumSpec,
    rng: &mut PlacementRng,
) -> Vec<&'p Candidate> {
    let mut remaining: Vec<&Candidate> = pool.iter().collect();
    let mut left_in_domain: HashMap<&DomainKey, usize> = HashMap::new();
    for candidate in pool {
        *left_in_domain.entry(&candidate.domain).or_default() += 1;
    }

    let mut placed: Vec<&Candidate> = Vec::with_capacity(quorum.ensemble_size());
    let mut placed_domains: Vec<&DomainKey> = Vec::with_capacity(quorum.ensemble_size());
    for position in 0..quorum.ensemble_size() {
        let scores: Vec<(usize, Reverse<usize>)> = remaining
            .iter()
            .map(|candidate| {
                (
                    window_cost(&placed_domains, position, &candidate.domain, quorum),
                    Reverse(left_in_domain.get(&candidate.domain).copied().unwrap_or(0)),
                )
            })
            .collect();
        let Some(pick) = pick_best(&scores, rng) else {
            break;
        };

        let chosen = remaining.swap_remove(pick);
        if let Some(left) = left_in_domain.get_mut(&chosen.domain) {
            *left = left.saturating_sub(1);
        }
        placed_domains.push(&chosen.domain);
        placed.push(chosen);
    }
    placed
}

/// Backtracking search for a full placement whose every window holds at most
/// `limit` bookies of one domain.
///
/// Branches over domains rather than bookies: bookies of one domain are
/// interchangeable for window loads. Domains with no member placed yet and the
/// same number of bookies are interchangeable too, so only one of them is
/// tried per position. Domain order is shuffled at every step.
fn search_positions<'p>(
    pool: &'p [Candidate],
    quorum: QuorumSpec,
    limit: usize,
    rng: &mut PlacementRng,
) -> Option<Vec<&'p Candidate>> {
    let mut groups: BTreeMap<&DomainKey, Vec<&Candidate>> = BTreeMap::new();
    for candidate in pool {
        groups.entry(&candidate.domain).or_default().push(candidate);
    }
    let (domains, mut members): (Vec<&DomainKey>, Vec<Vec<&Candidate>>) = groups.into_iter().unzip();

    let sizes: Vec<usize> = members.iter().map(Vec::len).collect();
    let mut search = DomainSearch {
        domains: &domains,
        sizes: &sizes,
        left: sizes.clone(),
        placed: Vec::with_capacity(quorum.ensemble_size()),
        quorum,
        limit,
    };
    if !search.extend(rng) {
        return None;
    }

    let mut sequence = Vec::with_capacity(quorum.ensemble_size());
    for group in &mut members {
        group.shuffle(rng);
    }
    for domain in search.placed {
        let index = domains.iter().position(|d| *d == domain)?;
        sequence.push(members[index].pop()?);
    }
    Some(sequence)
}

struct DomainSearch<'a, 'p> {
    domains: &'a [&'p DomainKey],
    sizes: &'a [usize],
    left: Vec<usize>,
    placed: Vec<&'p DomainKey>,
    quorum: QuorumSpec,
    limit: usize,
}

impl DomainSearch<'_, '_> {
    fn extend(&mut self, rng: &mut PlacementRng) -> bool {
        let position = self.placed.len();
        if position == self.quorum.ensemble_size() {
            return true;
        }

        let mut order: Vec<usize> = (0..self.domains.len()).filter(|&d| self.left[d] > 0).collect();
        order.shuffle(rng);
        let mut fresh_sizes_tried = HashSet::new();
        for d in order {
            let fresh = self.left[d] == self.sizes[d];
            if fresh && !fresh_sizes_tried.insert(self.sizes[d]) {
                continue;
            }
            if window_cost(&self.placed, position, self.domains[d], self.quorum) > self.limit {
                continue;
            }

            self.left[d] -= 1;
            self.placed.push(self.domains[d]);
            if self.extend(rng) {
                return true;
            }
            self.placed.pop();
            self.left[d] += 1;
        }
        false
    }
}

/// Index of a uniformly random entry among those with the lowest score.
fn pick_best<S: Ord + Copy>(scores: &[S], rng: &mut PlacementRng) -> Option<usize> {
    let best = scores.iter().min().copied()?;
    let ties: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|(_, score)| **score == best)
        .map(|(index, _)| index)
        .collect();
    Some(ties[rng.random_range(0..ties.len())])
}

/// Worst count `domain` would reach in any window covering `position`,
/// counting `domain` itself at `position`. Positions beyond `placed` are empty.
fn window_cost(
    placed: &[&DomainKey],
    position: usize,
    domain: &DomainKey,
    quorum: QuorumSpec,
) -> usize {
    quorum
        .windows_containing(position)
        .map(|start| {
            let others = quorum
                .window(start)
                .filter(|&p| p != position)
                .filter(|&p| placed.get(p).is_some_and(|d| *d == domain))
                .count();
            others + 1
        })
        .max()
        .unwrap_or(1)
}

/// Members of `domain` elsewhere in the ensemble.
fn ensemble_share(members: &[&DomainKey], position: usize, domain: &DomainKey) -> usize {
    members
        .iter()
        .enumerate()
        .filter(|(p, d)| *p != position && **d == domain)
        .count()
}

/// Worst per-domain count over every write-quorum window of a full ensemble.
fn max_window_load(members: &[&Candidate], quorum: QuorumSpec) -> usize {
    if members.len() < quorum.ensemble_size() {
        return 0;
    }
    (0..quorum.ensemble_size())
        .map(|start| {
            let mut counts: HashMap<&DomainKey, usize> = HashMap::new();
            for p in quorum.window(start) {
                *counts.entry(&members[p].domain).or_default() += 1;
            }
            counts.into_values().max().unwrap_or(0)
        })
        .max()
        .unwrap_or(0)
}
