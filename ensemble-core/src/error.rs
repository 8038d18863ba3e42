//! Error types for ensemble placement.

use crate::types::{BookieAddress, PolicyState};

/// Errors returned by placement, replacement and lifecycle operations.
///
/// No variant is retried inside the placement core; retry policy belongs to
/// the caller. See [`PlacementError::is_retryable`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// Quorum sizes violate `ensemble >= write quorum >= ack quorum >= 1`.
    #[error(
        "invalid quorum config: ensemble {ensemble_size}, write quorum {write_quorum_size}, ack quorum {ack_quorum_size}"
    )]
    InvalidQuorumConfig {
        /// Requested ensemble size.
        ensemble_size: usize,
        /// Requested write quorum size.
        write_quorum_size: usize,
        /// Requested ack quorum size.
        ack_quorum_size: usize,
    },

    /// The writable pool (after exclusions) is too small.
    #[error("not enough bookies: need {required}, have {available}")]
    NotEnoughBookies {
        /// Number of bookies the call needed.
        required: usize,
        /// Number of eligible bookies in the pool.
        available: usize,
    },

    /// The operation was invoked outside the `Active` lifecycle state.
    #[error("placement policy not active (state: {state})")]
    PolicyNotActive {
        /// The state the policy was in.
        state: PolicyState,
    },

    /// Strict mode could not keep every write-quorum window within the
    /// per-domain bound.
    #[error("diversity constraint unsatisfiable: bound {bound} per domain, best achieved {achieved}")]
    DiversityConstraintUnsatisfiable {
        /// Maximum bookies from one domain allowed in a write-quorum window.
        bound: usize,
        /// Smallest worst-case count the engine could reach.
        achieved: usize,
    },

    /// The ensemble handed to a replacement call is malformed.
    #[error("invalid ensemble: {reason}")]
    InvalidEnsemble {
        /// What is wrong with it.
        reason: String,
    },

    /// The bookie to replace is not a member of the ensemble.
    #[error("bookie {bookie} is not a member of the ensemble")]
    BookieNotInEnsemble {
        /// The bookie the caller asked to replace.
        bookie: BookieAddress,
    },

    /// Invalid lifecycle transition.
    #[error("invalid lifecycle transition from {from} to {to}")]
    InvalidLifecycle {
        /// State the policy was in.
        from: PolicyState,
        /// State the caller tried to move to.
        to: PolicyState,
    },
}

impl PlacementError {
    /// Whether the same call may succeed later without being changed.
    ///
    /// Only pool-size and diversity shortfalls qualify: both can clear after
    /// the cluster grows or the caller narrows its exclusions.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NotEnoughBookies { .. } | Self::DiversityConstraintUnsatisfiable { .. }
        )
    }
}

/// Result type for placement operations.
pub type PlacementResult<T> = Result<T, PlacementError>;

/// Error parsing a bookie address from a string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    /// No port separator (`:`) found in the input.
    #[error("missing port separator")]
    MissingPort,
    /// The port number could not be parsed.
    #[error("invalid port number")]
    InvalidPort,
    /// The host part is empty.
    #[error("empty host")]
    EmptyHost,
    /// An IPv6 literal opened with `[` was never closed.
    #[error("unterminated IPv6 bracket")]
    UnterminatedBracket,
    /// An IPv6 literal was given without brackets.
    #[error("IPv6 literals must be bracketed")]
    UnbracketedIpv6,
}

/// Error parsing a failure-domain path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainParseError {
    /// The path does not start with `/`.
    #[error("domain path must start with '/'")]
    MissingLeadingSlash,
    /// The path has no segments.
    #[error("domain path is empty")]
    Empty,
    /// A segment is empty or contains a separator.
    #[error("invalid domain segment at position {position}")]
    EmptySegment {
        /// Zero-based index of the offending segment.
        position: usize,
    },
}

/// Error building a topology table from strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    /// A bookie address failed to parse.
    #[error("bad bookie address {address:?}: {source}")]
    Address {
        /// The offending input.
        address: String,
        /// Why it was rejected.
        source: AddressParseError,
    },
    /// A domain path failed to parse.
    #[error("bad domain path {path:?}: {source}")]
    Domain {
        /// The offending input.
        path: String,
        /// Why it was rejected.
        source: DomainParseError,
    },
}
