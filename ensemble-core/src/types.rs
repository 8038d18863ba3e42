//! Core types for bookie addressing.
//!
//! - [`BookieAddress`]: host + port identifying a storage node
//! - [`WriteSet`]: ensemble positions holding one entry's copies
//! - [`FailureHistory`]: caller-owned record of observed bookie failures
//! - [`PolicyState`]: lifecycle state of a placement policy

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AddressParseError;

/// Ordered ensemble positions that hold a copy of a given entry.
pub type WriteSet = Vec<usize>;

/// Last observed failure timestamp per bookie.
///
/// The unit (monotonic ticks, wall-clock millis) is chosen by the caller; only
/// the relative order of timestamps matters. A bookie without an entry has
/// never been observed failing.
pub type FailureHistory = HashMap<BookieAddress, u64>;

/// Network identity of a bookie (`host:port`).
///
/// Equality, hashing and ordering are by value. Ordering (host, then port) is
/// only used to iterate candidate pools canonically; placement never prefers
/// one bookie over another because of it.
///
/// # Examples
///
/// ```
/// use ensemble_core::BookieAddress;
///
/// let bookie = BookieAddress::parse("bookie-1.rack-a:3181").unwrap();
/// assert_eq!(bookie.host(), "bookie-1.rack-a");
/// assert_eq!(bookie.port(), 3181);
/// assert_eq!(bookie.to_string(), "bookie-1.rack-a:3181");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookieAddress {
    host: String,
    port: u16,
}

impl BookieAddress {
    /// Create a new bookie address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or IP literal (IPv6 literals are stored without brackets).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port number.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Parse from `"host:port"` or `"[v6-literal]:port"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is empty, the port is missing or not a
    /// valid `u16`, or an IPv6 bracket is left open.
    pub fn parse(s: &str) -> Result<Self, AddressParseError> {
        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or(AddressParseError::UnterminatedBracket)?;
            let port_str = tail
                .strip_prefix(':')
                .ok_or(AddressParseError::MissingPort)?;
            return Self::from_parts(host, port_str);
        }

        let (host, port_str) = s.rsplit_once(':').ok_or(AddressParseError::MissingPort)?;
        // An unbracketed IPv6 literal is ambiguous.
        if host.contains(':') {
            return Err(AddressParseError::UnbracketedIpv6);
        }
        Self::from_parts(host, port_str)
    }

    fn from_parts(host: &str, port_str: &str) -> Result<Self, AddressParseError> {
        if host.is_empty() {
            return Err(AddressParseError::EmptyHost);
        }
        let port: u16 = port_str
            .parse()
            .map_err(|_| AddressParseError::InvalidPort)?;
        Ok(Self::new(host, port))
    }
}

impl std::fmt::Display for BookieAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for BookieAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BookieAddress {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BookieAddress> for String {
    fn from(value: BookieAddress) -> Self {
        value.to_string()
    }
}

/// Lifecycle state of a placement policy.
///
/// ```text
/// Uninitialized ──initialize──> Active ──uninitialize──> TornDown
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyState {
    /// Constructed but not yet initialized.
    Uninitialized,
    /// Accepting cluster changes, placement and read-ordering calls.
    Active,
    /// Uninitialized after being active; every operation is rejected.
    TornDown,
}

impl std::fmt::Display for PolicyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Active => write!(f, "Active"),
            Self::TornDown => write!(f, "TornDown"),
        }
    }
}
