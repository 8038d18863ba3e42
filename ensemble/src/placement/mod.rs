//! Ensemble placement.
//!
//! [`PlacementAlgorithm`] decides which domain a bookie counts against;
//! [`PlacementEngine`] runs selection over a cluster snapshot.

pub mod algorithm;
pub mod engine;

pub use algorithm::{DomainKey, PlacementAlgorithm};
pub use engine::{EnsemblePlacement, PlacementEngine, Replacement};
