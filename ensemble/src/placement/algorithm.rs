//! Placement algorithms: how a bookie maps to the domain diversity is
//! measured over.

use serde::{Deserialize, Serialize};

use crate::{BookieAddress, FailureDomain, TopologyResolver};

/// Placement algorithm selected at policy initialization.
///
/// All algorithms share the same selection procedure; they differ only in
/// which [`DomainKey`] a bookie counts against.
///
/// | Algorithm | Domain |
/// |-----------|--------|
/// | `RoundRobin` | every bookie is its own domain |
/// | `RackAware` | the full resolved path (`/region/rack`) |
/// | `RegionAware` | the outermost path segment (`/region`) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementAlgorithm {
    /// Ignore topology; spread purely at random.
    RoundRobin,
    /// Spread write quorums across racks.
    #[default]
    RackAware,
    /// Spread write quorums across regions.
    RegionAware,
}

impl PlacementAlgorithm {
    /// The diversity domain `bookie` counts against.
    ///
    /// Bookies the resolver cannot place become singleton domains, which is
    /// the worst case for the diversity check and never an error.
    pub fn domain_key(&self, bookie: &BookieAddress, resolver: &dyn TopologyResolver) -> DomainKey {
        let resolved = match self {
            Self::RoundRobin => None,
            Self::RackAware => resolver.resolve(bookie),
            Self::RegionAware => resolver.resolve(bookie).map(|domain| domain.truncate(1)),
        };
        match resolved {
            Some(domain) => DomainKey::Domain(domain),
            None => DomainKey::Singleton(bookie.clone()),
        }
    }
}

impl std::fmt::Display for PlacementAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoundRobin => write!(f, "round_robin"),
            Self::RackAware => write!(f, "rack_aware"),
            Self::RegionAware => write!(f, "region_aware"),
        }
    }
}

/// Identity of the domain a bookie counts against during placement.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DomainKey {
    /// A resolved failure domain shared by every bookie in it.
    Domain(FailureDomain),
    /// A bookie with no known domain, alone in its own.
    Singleton(BookieAddress),
}

impl std::fmt::Display for DomainKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Domain(domain) => write!(f, "{domain}"),
            Self::Singleton(bookie) => write!(f, "<{bookie}>"),
        }
    }
}
