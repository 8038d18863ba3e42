//! Topology resolution: mapping bookies to failure domains.
//!
//! The resolver is supplied by the host environment (DNS-to-rack tables,
//! cloud metadata, static configuration). Placement treats it as a pure
//! lookup; a bookie it cannot place is its own singleton domain.

use std::collections::HashMap;

use crate::domain::FailureDomain;
use crate::error::TopologyError;
use crate::types::BookieAddress;

/// Maps a bookie to the failure domain it lives in.
pub trait TopologyResolver: Send + Sync + std::fmt::Debug {
    /// The bookie's failure domain, or `None` if unknown.
    fn resolve(&self, bookie: &BookieAddress) -> Option<FailureDomain>;
}

/// Resolver that knows nothing: every bookie is its own domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownTopology;

impl TopologyResolver for UnknownTopology {
    fn resolve(&self, _bookie: &BookieAddress) -> Option<FailureDomain> {
        None
    }
}

/// In-memory bookie → domain table.
///
/// # Example
///
/// ```rust
/// use ensemble_core::{BookieAddress, StaticTopology, TopologyResolver};
///
/// let topology = StaticTopology::from_pairs([
///     ("10.0.0.1:3181", "/us-east/rack-1"),
///     ("10.0.0.2:3181", "/us-east/rack-2"),
/// ])
/// .unwrap();
///
/// let bookie = BookieAddress::parse("10.0.0.1:3181").unwrap();
/// assert_eq!(topology.resolve(&bookie).unwrap().to_string(), "/us-east/rack-1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticTopology {
    domains: HashMap<BookieAddress, FailureDomain>,
}

impl StaticTopology {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `("host:port", "/region/rack")` string pairs.
    ///
    /// # Errors
    ///
    /// Returns the first address or domain that fails to parse.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, TopologyError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut topology = Self::new();
        for (address, path) in pairs {
            let bookie = BookieAddress::parse(address).map_err(|source| TopologyError::Address {
                address: address.to_string(),
                source,
            })?;
            let domain = FailureDomain::parse(path).map_err(|source| TopologyError::Domain {
                path: path.to_string(),
                source,
            })?;
            topology.insert(bookie, domain);
        }
        Ok(topology)
    }

    /// Assign a bookie to a domain, returning its previous domain.
    pub fn insert(&mut self, bookie: BookieAddress, domain: FailureDomain) -> Option<FailureDomain> {
        self.domains.insert(bookie, domain)
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, bookie: BookieAddress, domain: FailureDomain) -> Self {
        self.insert(bookie, domain);
        self
    }

    /// Number of mapped bookies.
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Whether no bookie is mapped.
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

impl TopologyResolver for StaticTopology {
    fn resolve(&self, bookie: &BookieAddress) -> Option<FailureDomain> {
        self.domains.get(bookie).cloned()
    }
}
