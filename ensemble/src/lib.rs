//! # Ensemble
//!
//! Rack- and region-aware ensemble placement for a quorum-replicated ledger
//! store, plus failure-aware read ordering.
//!
//! A ledger is striped over an *ensemble* of storage nodes (bookies); each
//! entry goes to a *write quorum* of consecutive positions and is durable once
//! an *ack quorum* of them confirm. This crate decides which bookies form an
//! ensemble, which bookie replaces a failed member, and in which order to read
//! an entry back.
//!
//! ## Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              ensemble (this crate)                          │
//! │   EnsemblePlacementPolicy: lifecycle + wiring               │
//! ├──────────────────────────┬──────────────────────────────────┤
//! │  ClusterView             │       PlacementEngine            │
//! │  • writable / read-only  │       • new_ensemble             │
//! │  • copy-on-write swap    │       • replace_bookie           │
//! │  • dead-bookie diff      │       • per-window diversity     │
//! │                          │       ReadOrderer                │
//! │                          │       • failure-recency order    │
//! ├──────────────────────────┴──────────────────────────────────┤
//! │                     ensemble-core                           │
//! │  Provider traits: TopologyResolver, RandomProvider          │
//! │  Core types: BookieAddress, FailureDomain, QuorumSpec       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::HashSet;
//! use std::sync::Arc;
//!
//! use ensemble::{
//!     BookieAddress, EnsemblePlacementPolicy, NoopStats, PlacementConfig, UnknownTopology,
//! };
//!
//! let policy = EnsemblePlacementPolicy::new();
//! policy
//!     .initialize(
//!         PlacementConfig::for_testing(7),
//!         Arc::new(UnknownTopology),
//!         Arc::new(NoopStats),
//!     )
//!     .unwrap();
//!
//! let bookies = (0..5).map(|i| BookieAddress::new(format!("bookie-{i}"), 3181));
//! policy.on_cluster_changed(bookies, []).unwrap();
//!
//! let ensemble = policy.new_ensemble(3, 2, 2, &HashSet::new()).unwrap();
//! assert_eq!(ensemble.len(), 3);
//! ```
//!
//! ## Which Crate to Use
//!
//! | Use case | Crate |
//! |----------|-------|
//! | Placement policy (recommended) | `ensemble` |
//! | Value types and provider traits only | `ensemble-core` |
//!
//! ## Documentation
//!
//! - [`ensemble_core`] - Provider traits and core types
//! - [`policy`] - Lifecycle and the public operations
//! - [`placement`] - Selection algorithms
//! - [`read_order`] - Read ordering

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

// Re-export all public items from the core crate
pub use ensemble_core::*;

pub mod cluster;
pub mod config;
pub mod placement;
pub mod policy;
pub mod read_order;
pub mod stats;

pub use cluster::{ClusterSnapshot, ClusterVersion, ClusterView};
pub use config::{ConfigError, DiversityMode, PlacementConfig, DEFAULT_PLACEMENT_ATTEMPTS};
pub use placement::{DomainKey, EnsemblePlacement, PlacementAlgorithm, PlacementEngine, Replacement};
pub use policy::EnsemblePlacementPolicy;
pub use read_order::ReadOrderer;
pub use stats::{CountingStats, NoopStats, PlacementStats, PlacementStatsSnapshot};
