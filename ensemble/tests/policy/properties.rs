//! Property tests for placement and read ordering laws.

use std::collections::HashSet;

use ensemble::{BookieAddress, FailureHistory, ReadOrderer};
use proptest::prelude::*;

use super::common::{addr, flat_policy};

/// (pool size, ensemble, write quorum, ack quorum) with a pool large enough.
fn arb_quorum() -> impl Strategy<Value = (u16, usize, usize, usize)> {
    (1usize..8)
        .prop_flat_map(|e| (Just(e), 1..=e))
        .prop_flat_map(|(e, w)| (Just(e), Just(w), 1..=w))
        .prop_flat_map(|(e, w, a)| ((e as u16)..16, Just(e), Just(w), Just(a)))
}

/// A write set over an ensemble of `n` bookies plus a failure history.
fn arb_read_case() -> impl Strategy<Value = (Vec<BookieAddress>, Vec<usize>, FailureHistory)> {
    (1u16..8).prop_flat_map(|n| {
        let positions: Vec<usize> = (0..n as usize).collect();
        (
            Just((0..n).map(addr).collect::<Vec<_>>()),
            Just(positions).prop_shuffle(),
            prop::collection::hash_map((0..n).prop_map(addr), 0u64..20, 0..n as usize),
        )
    })
}

proptest! {
    #[test]
    fn test_new_ensemble_distinct_writable_not_excluded(
        (pool, e, w, a) in arb_quorum(),
        excluded in prop::collection::hash_set(0u16..16, 0..4),
        seed in any::<u64>(),
    ) {
        let policy = flat_policy(seed, pool);
        let exclude: HashSet<BookieAddress> = excluded.into_iter().map(addr).collect();
        let available = (0..pool).map(addr).filter(|b| !exclude.contains(b)).count();

        match policy.new_ensemble(e, w, a, &exclude) {
            Ok(ensemble) => {
                let members: HashSet<_> = ensemble.iter().collect();
                prop_assert_eq!(ensemble.len(), e);
                prop_assert_eq!(members.len(), e);
                for bookie in &ensemble {
                    prop_assert!(!exclude.contains(bookie));
                    prop_assert!((0..pool).map(addr).any(|b| &b == bookie));
                }
            }
            Err(error) => {
                prop_assert!(available < e, "unexpected {error}");
            }
        }
    }

    #[test]
    fn test_replacement_outside_ensemble_and_exclusions(
        (pool, e, w, a) in arb_quorum(),
        excluded in prop::collection::hash_set(0u16..16, 0..4),
        target in any::<prop::sample::Index>(),
        seed in any::<u64>(),
    ) {
        let policy = flat_policy(seed, pool);
        let ensemble = policy.new_ensemble(e, w, a, &HashSet::new()).expect("ensemble");
        let exclude: HashSet<BookieAddress> = excluded.into_iter().map(addr).collect();
        let to_replace = target.get(&ensemble).clone();

        if let Ok(replacement) = policy.replace_bookie(e, w, a, &ensemble, &to_replace, &exclude) {
            prop_assert!(!ensemble.contains(&replacement));
            prop_assert!(!exclude.contains(&replacement));
        } else {
            let left = (0..pool)
                .map(addr)
                .filter(|b| !ensemble.contains(b) && !exclude.contains(b))
                .count();
            prop_assert_eq!(left, 0);
        }
    }

    #[test]
    fn test_read_order_is_permutation_unfailed_first_older_first(
        (ensemble, write_set, history) in arb_read_case(),
    ) {
        let order = ReadOrderer::new().reorder_read_sequence(&ensemble, &write_set, &history);

        let mut sorted_in = write_set.clone();
        let mut sorted_out = order.clone();
        sorted_in.sort_unstable();
        sorted_out.sort_unstable();
        prop_assert_eq!(sorted_in, sorted_out);

        let failed_at = |p: usize| history.get(&ensemble[p]).copied();
        for pair in order.windows(2) {
            match (failed_at(pair[0]), failed_at(pair[1])) {
                (Some(_), None) => prop_assert!(false, "failed before unfailed: {:?}", order),
                (Some(x), Some(y)) => prop_assert!(x <= y, "newer failure first: {:?}", order),
                _ => {}
            }
        }
    }

    #[test]
    fn test_read_order_identity_without_history(
        (ensemble, write_set, _history) in arb_read_case(),
    ) {
        let orderer = ReadOrderer::new();
        let empty = FailureHistory::new();
        prop_assert_eq!(orderer.reorder_read_sequence(&ensemble, &write_set, &empty), write_set.clone());
        prop_assert_eq!(orderer.reorder_read_lac_sequence(&ensemble, &write_set, &empty), write_set);
    }

    #[test]
    fn test_repeated_cluster_change_reports_nothing(
        writable in prop::collection::btree_set(0u16..12, 0..12),
        read_only in prop::collection::btree_set(0u16..12, 0..12),
    ) {
        let policy = flat_policy(0, 12);
        let writable: Vec<_> = writable.into_iter().map(addr).collect();
        let read_only: Vec<_> = read_only.into_iter().map(addr).collect();

        policy
            .on_cluster_changed(writable.clone(), read_only.clone())
            .expect("cluster change");
        let dead = policy
            .on_cluster_changed(writable, read_only)
            .expect("cluster change");
        prop_assert!(dead.is_empty());
    }
}
