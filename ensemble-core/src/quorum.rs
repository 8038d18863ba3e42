//! Quorum parameters and write-quorum window arithmetic.
//!
//! An entry is written to `write_quorum_size` consecutive ensemble positions
//! (wrapping around the end of the ensemble) and is durable once
//! `ack_quorum_size` of them acknowledge:
//!
//! ```text
//! ensemble:  [ b0 | b1 | b2 | b3 | b4 ]      ensemble = 5, write quorum = 3
//! window 0:  [ b0   b1   b2 ]
//! window 3:                 [ b3   b4 ] + [ b0 ]   (wraps)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::PlacementError;

/// Validated quorum sizes: `ensemble >= write quorum >= ack quorum >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuorumSpec {
    ensemble_size: usize,
    write_quorum_size: usize,
    ack_quorum_size: usize,
}

impl QuorumSpec {
    /// Validate quorum sizes.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::InvalidQuorumConfig`] if any size is zero or
    /// the sizes are not non-increasing.
    pub fn new(
        ensemble_size: usize,
        write_quorum_size: usize,
        ack_quorum_size: usize,
    ) -> Result<Self, PlacementError> {
        if ack_quorum_size < 1
            || write_quorum_size < ack_quorum_size
            || ensemble_size < write_quorum_size
        {
            return Err(PlacementError::InvalidQuorumConfig {
                ensemble_size,
                write_quorum_size,
                ack_quorum_size,
            });
        }
        Ok(Self {
            ensemble_size,
            write_quorum_size,
            ack_quorum_size,
        })
    }

    /// Number of bookies in the ensemble.
    pub fn ensemble_size(&self) -> usize {
        self.ensemble_size
    }

    /// Number of consecutive positions holding each entry.
    pub fn write_quorum_size(&self) -> usize {
        self.write_quorum_size
    }

    /// Acknowledgements needed before an entry is durable.
    pub fn ack_quorum_size(&self) -> usize {
        self.ack_quorum_size
    }

    /// Maximum bookies one failure domain may hold inside a write-quorum window.
    ///
    /// Losing a whole domain then costs at most `write - ack` copies, so the
    /// ack quorum stays reachable. When `write == ack` no domain loss is
    /// survivable and the bound floors at one bookie per domain per window.
    pub fn max_per_domain(&self) -> usize {
        (self.write_quorum_size - self.ack_quorum_size).max(1)
    }

    /// Start offsets of every write-quorum window that covers `position`.
    pub fn windows_containing(&self, position: usize) -> impl Iterator<Item = usize> + '_ {
        let e = self.ensemble_size;
        (0..self.write_quorum_size).map(move |back| (position % e + e - back) % e)
    }

    /// Ensemble positions covered by the window starting at `start`.
    pub fn window(&self, start: usize) -> impl Iterator<Item = usize> + '_ {
        let e = self.ensemble_size;
        (0..self.write_quorum_size).map(move |offset| (start + offset) % e)
    }
}

impl std::fmt::Display for QuorumSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "E{}/W{}/A{}",
            self.ensemble_size, self.write_quorum_size, self.ack_quorum_size
        )
    }
}
