//! # ensemble-core
//!
//! Core abstractions shared by the ensemble placement engine.
//!
//! This crate provides the value types and capabilities that placement and
//! read ordering are computed over:
//!
//! - **Addressing**: [`BookieAddress`] identifies a storage node (`host:port`)
//! - **Topology**: [`FailureDomain`] paths and the [`TopologyResolver`] capability
//! - **Quorums**: [`QuorumSpec`] and its write-quorum window arithmetic
//! - **Randomness**: the seedable [`RandomProvider`] capability
//! - **Errors**: the [`PlacementError`] taxonomy
//!
//! ## Provider Traits
//!
//! The capability traits let the same placement code run against a live
//! cluster and against fixed test fixtures:
//!
//! - [`TopologyResolver`]: address to failure-domain lookup
//! - [`RandomProvider`]: independent per-call generators, seedable for tests

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

mod domain;
mod error;
mod quorum;
mod random;
mod topology;
mod types;

// Error exports
pub use error::{
    AddressParseError, DomainParseError, PlacementError, PlacementResult, TopologyError,
};

// Provider trait exports
pub use random::{EntropyRandomProvider, PlacementRng, RandomProvider, SeededRandomProvider};
pub use topology::{StaticTopology, TopologyResolver, UnknownTopology};

// Core type exports
pub use domain::FailureDomain;
pub use quorum::QuorumSpec;
pub use types::{BookieAddress, FailureHistory, PolicyState, WriteSet};
