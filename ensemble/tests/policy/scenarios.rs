//! Concrete placement and read-ordering scenarios.

use std::collections::HashSet;
use std::sync::Arc;

use ensemble::{
    CountingStats, DiversityMode, FailureHistory, PlacementAlgorithm, PlacementConfig,
    PlacementError, PlacementStatsSnapshot, QuorumSpec,
};

use super::common::{addr, flat_policy, policy_with, rack_of, racked_topology};

#[test]
fn test_three_of_five_then_replace() {
    let policy = flat_policy(1, 5);
    let pool: HashSet<_> = (0..5).map(addr).collect();

    let ensemble = policy.new_ensemble(3, 2, 2, &HashSet::new()).expect("ensemble");
    let members: HashSet<_> = ensemble.iter().cloned().collect();
    assert_eq!(members.len(), 3);
    assert!(members.is_subset(&pool));

    let remaining: HashSet<_> = pool.difference(&members).cloned().collect();
    let replacement = policy
        .replace_bookie(3, 2, 2, &ensemble, &ensemble[1], &HashSet::new())
        .expect("replacement");
    assert!(remaining.contains(&replacement));
}

#[test]
fn test_read_order_older_failure_first() {
    let policy = flat_policy(2, 3);
    let ensemble = vec![addr(0), addr(1), addr(2)];
    let history = FailureHistory::from([(addr(1), 100), (addr(2), 50)]);

    let order = policy
        .reorder_read_sequence(&ensemble, &[0, 1, 2], &history)
        .expect("order");
    assert_eq!(order, vec![0, 2, 1]);

    let lac_order = policy
        .reorder_read_lac_sequence(&ensemble, &[0, 1, 2], &history)
        .expect("order");
    assert_eq!(lac_order, vec![0, 2, 1]);
}

#[test]
fn test_pool_too_small() {
    let policy = flat_policy(3, 2);
    assert_eq!(
        policy.new_ensemble(3, 2, 2, &HashSet::new()),
        Err(PlacementError::NotEnoughBookies {
            required: 3,
            available: 2
        })
    );
}

#[test]
fn test_write_quorum_larger_than_ensemble() {
    let policy = flat_policy(4, 10);
    assert_eq!(
        policy.new_ensemble(3, 5, 2, &HashSet::new()),
        Err(PlacementError::InvalidQuorumConfig {
            ensemble_size: 3,
            write_quorum_size: 5,
            ack_quorum_size: 2
        })
    );
}

#[test]
fn test_dead_bookies_reported_once() {
    let policy = flat_policy(5, 5);

    let dead = policy
        .on_cluster_changed([addr(0), addr(1)], [addr(2)])
        .expect("cluster change");
    assert_eq!(dead.into_iter().collect::<Vec<_>>(), vec![addr(3), addr(4)]);

    let dead = policy
        .on_cluster_changed([addr(0), addr(1)], [addr(2)])
        .expect("cluster change");
    assert!(dead.is_empty());

    let snapshot = policy.cluster_snapshot().expect("snapshot");
    assert!(snapshot.is_read_only(&addr(2)));
    assert_eq!(snapshot.writable_count(), 2);
}

#[test]
fn test_excluded_bookies_never_placed() {
    let policy = flat_policy(6, 6);
    let exclude = HashSet::from([addr(0), addr(5)]);

    for _ in 0..20 {
        let ensemble = policy.new_ensemble(4, 3, 2, &exclude).expect("ensemble");
        assert!(ensemble.iter().all(|b| !exclude.contains(b)));
    }
}

#[test]
fn test_rack_aware_every_window_diverse() {
    let (bookies, topology) = racked_topology(3, 3);
    let policy = policy_with(
        PlacementConfig::for_testing(7).with_diversity_mode(DiversityMode::Strict),
        Arc::new(topology),
        Arc::new(CountingStats::new()),
    );
    policy.on_cluster_changed(bookies, []).expect("cluster change");
    let quorum = QuorumSpec::new(6, 3, 2).expect("quorum");

    for _ in 0..20 {
        let ensemble = policy.new_ensemble(6, 3, 2, &HashSet::new()).expect("ensemble");
        for start in 0..6 {
            let racks: Vec<u16> = quorum
                .window(start)
                .map(|p| rack_of(&ensemble[p], 3))
                .collect();
            let distinct: HashSet<_> = racks.iter().collect();
            assert_eq!(distinct.len(), racks.len(), "window {start}: {racks:?}");
        }
    }
}

#[test]
fn test_single_rack_strict_vs_best_effort() {
    let (bookies, topology) = racked_topology(1, 6);
    let topology = Arc::new(topology);

    let strict = policy_with(
        PlacementConfig::for_testing(8).with_diversity_mode(DiversityMode::Strict),
        topology.clone(),
        Arc::new(CountingStats::new()),
    );
    strict
        .on_cluster_changed(bookies.clone(), [])
        .expect("cluster change");
    let result = strict.new_ensemble(3, 2, 1, &HashSet::new());
    assert_eq!(
        result,
        Err(PlacementError::DiversityConstraintUnsatisfiable {
            bound: 1,
            achieved: 2
        })
    );
    assert!(result.err().is_some_and(|e| e.is_retryable()));

    let stats = Arc::new(CountingStats::new());
    let best_effort = policy_with(
        PlacementConfig::for_testing(8).with_diversity_mode(DiversityMode::BestEffort),
        topology,
        stats.clone(),
    );
    best_effort
        .on_cluster_changed(bookies, [])
        .expect("cluster change");
    let ensemble = best_effort
        .new_ensemble(3, 2, 1, &HashSet::new())
        .expect("ensemble");
    assert_eq!(ensemble.len(), 3);
    assert_eq!(
        stats.snapshot(),
        PlacementStatsSnapshot {
            ensembles_created: 1,
            bookies_replaced: 0,
            diversity_fallbacks: 1,
            placement_failures: 0,
        }
    );
}

#[test]
fn test_region_aware_spreads_regions() {
    let topology = ensemble::StaticTopology::from_pairs([
        ("bookie-0:3181", "/eu/rack-1"),
        ("bookie-1:3181", "/eu/rack-2"),
        ("bookie-2:3181", "/us/rack-1"),
        ("bookie-3:3181", "/us/rack-2"),
    ])
    .expect("topology");
    let policy = policy_with(
        PlacementConfig::for_testing(9)
            .with_algorithm(PlacementAlgorithm::RegionAware)
            .with_diversity_mode(DiversityMode::Strict),
        Arc::new(topology),
        Arc::new(CountingStats::new()),
    );
    policy
        .on_cluster_changed((0..4).map(addr), [])
        .expect("cluster change");

    for _ in 0..10 {
        let ensemble = policy.new_ensemble(2, 2, 1, &HashSet::new()).expect("ensemble");
        let regions: HashSet<bool> = ensemble.iter().map(|b| b == &addr(0) || b == &addr(1)).collect();
        assert_eq!(regions.len(), 2, "{ensemble:?}");
    }
}

#[test]
fn test_same_seed_same_ensembles() {
    let (bookies, topology) = racked_topology(3, 4);
    let topology = Arc::new(topology);
    let run = || {
        let policy = policy_with(
            PlacementConfig::for_testing(42),
            topology.clone(),
            Arc::new(CountingStats::new()),
        );
        policy
            .on_cluster_changed(bookies.clone(), [])
            .expect("cluster change");
        (0..5)
            .map(|_| policy.new_ensemble(5, 3, 2, &HashSet::new()).expect("ensemble"))
            .collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_replace_keeps_other_positions_diverse() {
    let (bookies, topology) = racked_topology(3, 3);
    let policy = policy_with(
        PlacementConfig::for_testing(10).with_diversity_mode(DiversityMode::Strict),
        Arc::new(topology),
        Arc::new(CountingStats::new()),
    );
    policy.on_cluster_changed(bookies, []).expect("cluster change");

    let ensemble = policy.new_ensemble(3, 3, 2, &HashSet::new()).expect("ensemble");
    let failed = ensemble[0].clone();
    let replacement = policy
        .replace_bookie(3, 3, 2, &ensemble, &failed, &HashSet::new())
        .expect("replacement");
    assert_eq!(rack_of(&replacement, 3), rack_of(&failed, 3));
    assert!(!ensemble.contains(&replacement));
}

#[test]
fn test_uneven_racks_never_fall_back() {
    let topology = ensemble::StaticTopology::from_pairs([
        ("bookie-0:3181", "/dc-1/rack-a"),
        ("bookie-1:3181", "/dc-1/rack-a"),
        ("bookie-2:3181", "/dc-1/rack-b"),
        ("bookie-3:3181", "/dc-1/rack-b"),
        ("bookie-4:3181", "/dc-1/rack-c"),
    ])
    .expect("topology");
    let topology = Arc::new(topology);

    for mode in [DiversityMode::Strict, DiversityMode::BestEffort] {
        let stats = Arc::new(CountingStats::new());
        let policy = policy_with(
            PlacementConfig::for_testing(13).with_diversity_mode(mode),
            topology.clone(),
            stats.clone(),
        );
        policy
            .on_cluster_changed((0..5).map(addr), [])
            .expect("cluster change");

        for _ in 0..300 {
            let ensemble = policy.new_ensemble(5, 2, 1, &HashSet::new()).expect("ensemble");
            let racks: Vec<u16> = ensemble.iter().map(|b| rack_of(b, 2)).collect();
            for p in 0..5 {
                assert_ne!(racks[p], racks[(p + 1) % 5], "{mode:?}: {racks:?}");
            }
        }
        assert_eq!(stats.snapshot().diversity_fallbacks, 0, "{mode:?}");
        assert_eq!(stats.snapshot().ensembles_created, 300, "{mode:?}");
    }
}

#[test]
fn test_replacement_fallback_counted() {
    let (bookies, topology) = racked_topology(2, 3);
    let stats = Arc::new(CountingStats::new());
    let policy = policy_with(
        PlacementConfig::for_testing(14).with_diversity_mode(DiversityMode::BestEffort),
        Arc::new(topology),
        stats.clone(),
    );
    policy.on_cluster_changed(bookies, []).expect("cluster change");

    // Only rack 0 has a candidate left once bookies 4 and 5 are excluded.
    let current = vec![addr(0), addr(1), addr(3)];
    let exclude = HashSet::from([addr(4), addr(5)]);
    let replacement = policy
        .replace_bookie(3, 3, 2, &current, &addr(3), &exclude)
        .expect("replacement");
    assert_eq!(replacement, addr(2));

    assert_eq!(
        stats.snapshot(),
        PlacementStatsSnapshot {
            ensembles_created: 0,
            bookies_replaced: 1,
            diversity_fallbacks: 1,
            placement_failures: 0,
        }
    );
}

#[test]
fn test_strict_replacement_failure_counted() {
    let (bookies, topology) = racked_topology(2, 3);
    let stats = Arc::new(CountingStats::new());
    let policy = policy_with(
        PlacementConfig::for_testing(15).with_diversity_mode(DiversityMode::Strict),
        Arc::new(topology),
        stats.clone(),
    );
    policy.on_cluster_changed(bookies, []).expect("cluster change");

    let current = vec![addr(0), addr(1), addr(3)];
    let exclude = HashSet::from([addr(4), addr(5)]);
    assert_eq!(
        policy.replace_bookie(3, 3, 2, &current, &addr(3), &exclude),
        Err(PlacementError::DiversityConstraintUnsatisfiable {
            bound: 1,
            achieved: 3
        })
    );

    let counts = stats.snapshot();
    assert_eq!(counts.bookies_replaced, 0);
    assert_eq!(counts.placement_failures, 1);
}
