//! Failure domains: the fault boundaries bookies are grouped into.

use serde::{Deserialize, Serialize};

use crate::error::DomainParseError;

/// An ordered path identifying a bookie's fault boundary, outermost first
/// (e.g. region, then rack).
///
/// Two bookies in the same domain are assumed to fail together. Domains are
/// written as network paths: `/region-a/rack-3`.
///
/// # Examples
///
/// ```
/// use ensemble_core::FailureDomain;
///
/// let rack = FailureDomain::parse("/eu-west/rack-3").unwrap();
/// assert_eq!(rack.region(), "eu-west");
/// assert_eq!(rack.depth(), 2);
/// assert_eq!(rack.truncate(1).to_string(), "/eu-west");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FailureDomain {
    segments: Vec<String>,
}

impl FailureDomain {
    /// Build a domain from its path segments.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no segments or any segment is empty.
    pub fn new<I, S>(segments: I) -> Result<Self, DomainParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(DomainParseError::Empty);
        }
        if let Some(position) = segments.iter().position(|s| s.is_empty() || s.contains('/')) {
            return Err(DomainParseError::EmptySegment { position });
        }
        Ok(Self { segments })
    }

    /// Parse a network path such as `/region/rack`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not start with `/`, is just `/`,
    /// or contains an empty segment (`/region//rack`).
    pub fn parse(path: &str) -> Result<Self, DomainParseError> {
        let rest = path
            .strip_prefix('/')
            .ok_or(DomainParseError::MissingLeadingSlash)?;
        if rest.is_empty() {
            return Err(DomainParseError::Empty);
        }
        Self::new(rest.split('/'))
    }

    /// Path segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of path segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The outermost segment (the region in a `/region/rack` layout).
    pub fn region(&self) -> &str {
        // Construction guarantees at least one segment.
        self.segments.first().map(String::as_str).unwrap_or_default()
    }

    /// The prefix of this domain at most `depth` segments deep.
    ///
    /// A `depth` of zero is treated as one; a domain is never empty.
    pub fn truncate(&self, depth: usize) -> Self {
        let depth = depth.clamp(1, self.segments.len());
        Self {
            segments: self.segments[..depth].to_vec(),
        }
    }
}

impl std::fmt::Display for FailureDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for FailureDomain {
    type Err = DomainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FailureDomain {
    type Error = DomainParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FailureDomain> for String {
    fn from(value: FailureDomain) -> Self {
        value.to_string()
    }
}
