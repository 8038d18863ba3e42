//! Configuration for the placement policy.
//!
//! Quorum sizes are never configured here: callers pass them explicitly on
//! every placement call. The policy only carries the choices that stay fixed
//! for its lifetime.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::placement::PlacementAlgorithm;
use crate::{EntropyRandomProvider, RandomProvider, SeededRandomProvider};

/// Default number of selection passes per `new_ensemble` call.
pub const DEFAULT_PLACEMENT_ATTEMPTS: usize = 3;

/// What to do when the per-domain diversity bound cannot be met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiversityMode {
    /// Fail the placement with `DiversityConstraintUnsatisfiable`.
    Strict,
    /// Return the most diverse placement found and record the shortfall.
    #[default]
    BestEffort,
}

/// Errors from loading a [`PlacementConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The JSON document could not be decoded.
    #[error("invalid placement config: {0}")]
    Json(#[from] serde_json::Error),

    /// `placement_attempts` must be at least one.
    #[error("placement_attempts must be at least 1 (got {attempts})")]
    InvalidAttempts {
        /// The rejected value.
        attempts: usize,
    },
}

/// Configuration for a placement policy instance.
///
/// Missing keys take their defaults when decoded from JSON:
///
/// ```rust
/// use ensemble::{DiversityMode, PlacementAlgorithm, PlacementConfig};
///
/// let config = PlacementConfig::from_json_str(r#"{ "diversity_mode": "strict" }"#).unwrap();
/// assert_eq!(config.diversity_mode, DiversityMode::Strict);
/// assert_eq!(config.algorithm, PlacementAlgorithm::RackAware);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// How bookies map to diversity domains.
    pub algorithm: PlacementAlgorithm,

    /// Whether an unmet diversity bound fails placement.
    pub diversity_mode: DiversityMode,

    /// Selection passes per `new_ensemble` call when a pass misses the bound.
    pub placement_attempts: usize,

    /// Fixed seed for tie-breaking.
    ///
    /// `None` draws from entropy. Set it only for tests and reproductions.
    pub random_seed: Option<u64>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            algorithm: PlacementAlgorithm::RackAware,
            diversity_mode: DiversityMode::BestEffort,
            placement_attempts: DEFAULT_PLACEMENT_ATTEMPTS,
            random_seed: None,
        }
    }
}

impl PlacementConfig {
    /// Create a configuration for deterministic tests.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            random_seed: Some(seed),
            ..Self::default()
        }
    }

    /// Decode a configuration from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if decoding or validation fails.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAttempts`] if `placement_attempts` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.placement_attempts == 0 {
            return Err(ConfigError::InvalidAttempts {
                attempts: self.placement_attempts,
            });
        }
        Ok(())
    }

    /// Use the given placement algorithm.
    pub fn with_algorithm(mut self, algorithm: PlacementAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Use the given diversity mode.
    pub fn with_diversity_mode(mut self, diversity_mode: DiversityMode) -> Self {
        self.diversity_mode = diversity_mode;
        self
    }

    /// Use the given number of selection passes.
    pub fn with_placement_attempts(mut self, attempts: usize) -> Self {
        self.placement_attempts = attempts;
        self
    }

    /// Use a fixed tie-breaking seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// The random provider this configuration asks for.
    pub fn random_provider(&self) -> Arc<dyn RandomProvider> {
        match self.random_seed {
            Some(seed) => Arc::new(SeededRandomProvider::new(seed)),
            None => Arc::new(EntropyRandomProvider::new()),
        }
    }
}
