//! Shared fixtures for policy tests.

use std::sync::Arc;

use ensemble::{
    BookieAddress, EnsemblePlacementPolicy, NoopStats, PlacementConfig, PlacementStats,
    StaticTopology, TopologyResolver, UnknownTopology,
};

/// Install a fmt subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Bookie `n` of a test cluster.
pub fn addr(n: u16) -> BookieAddress {
    BookieAddress::new(format!("bookie-{n}"), 3181)
}

/// `racks` racks in one region with `per_rack` bookies each; bookie
/// `r * per_rack + i` lives in `/dc-1/rack-r`.
pub fn racked_topology(racks: u16, per_rack: u16) -> (Vec<BookieAddress>, StaticTopology) {
    let mut bookies = Vec::new();
    let mut pairs = Vec::new();
    for r in 0..racks {
        for i in 0..per_rack {
            let bookie = addr(r * per_rack + i);
            pairs.push((bookie.to_string(), format!("/dc-1/rack-{r}")));
            bookies.push(bookie);
        }
    }
    let topology = StaticTopology::from_pairs(
        pairs.iter().map(|(a, d)| (a.as_str(), d.as_str())),
    )
    .expect("topology");
    (bookies, topology)
}

/// Rack number of a bookie built by [`racked_topology`].
pub fn rack_of(bookie: &BookieAddress, per_rack: u16) -> u16 {
    let n: u16 = bookie
        .host()
        .trim_start_matches("bookie-")
        .parse()
        .expect("numbered bookie");
    n / per_rack
}

/// An active policy with the given config, resolver and stats sink.
pub fn policy_with(
    config: PlacementConfig,
    resolver: Arc<dyn TopologyResolver>,
    stats: Arc<dyn PlacementStats>,
) -> EnsemblePlacementPolicy {
    init_tracing();
    let policy = EnsemblePlacementPolicy::new();
    policy.initialize(config, resolver, stats).expect("initialize");
    policy
}

/// An active seeded policy with no topology over bookies `0..n`.
pub fn flat_policy(seed: u64, n: u16) -> EnsemblePlacementPolicy {
    let policy = policy_with(
        PlacementConfig::for_testing(seed),
        Arc::new(UnknownTopology),
        Arc::new(NoopStats),
    );
    policy
        .on_cluster_changed((0..n).map(addr), [])
        .expect("cluster change");
    policy
}
