//! Schema versions
//!
//! Provides [`Version`], a dotted `major.minor[.patch]` identifier with numeric ordering.

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::VersionError;

/// Dotted schema version
///
/// Comparison is purely numeric and component-wise. A missing patch
/// component is treated as `0`, so `"1.2"` and `"1.2.0"` compare equal.
///
/// # Examples
/// ```
/// # use confvault_document::Version;
/// let short = Version::parse("1.2").unwrap();
/// let long = Version::parse("1.2.0").unwrap();
/// assert_eq!(short, long);
/// assert!(Version::parse("1.10").unwrap() > Version::parse("1.9").unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
}

impl Version {
    /// Create version from components
    #[inline]
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a dotted version string with two or three numeric components
    ///
    /// # Errors
    /// Returns error if the string is empty, has the wrong number of
    /// components, or any component is not a non-negative integer
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let parts: Vec<&str> = trimmed.split('.').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(VersionError::ComponentCount {
                version: trimmed.to_string(),
                count: parts.len(),
            });
        }

        let mut components = [0u64; 3];
        for (slot, part) in components.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionError::InvalidComponent {
                    version: trimmed.to_string(),
                    component: (*part).to_string(),
                });
            }
            *slot = part.parse().map_err(|_| VersionError::InvalidComponent {
                version: trimmed.to_string(),
                component: (*part).to_string(),
            })?;
        }

        Ok(Self::new(components[0], components[1], components[2]))
    }

    /// Compare two version strings numerically
    ///
    /// # Errors
    /// Returns error if either string fails to parse
    pub fn compare(a: &str, b: &str) -> Result<Ordering, VersionError> {
        Ok(Self::parse(a)?.cmp(&Self::parse(b)?))
    }

    /// Check whether two version strings denote the same version
    ///
    /// Unparsable strings are only equal when textually identical.
    #[must_use]
    pub fn same(a: &str, b: &str) -> bool {
        match (Self::parse(a), Self::parse(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => a.trim() == b.trim(),
        }
    }

    /// Major component
    #[inline]
    #[must_use]
    pub const fn major(&self) -> u64 {
        self.major
    }

    /// Minor component
    #[inline]
    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.minor
    }

    /// Patch component (`0` when omitted)
    #[inline]
    #[must_use]
    pub const fn patch(&self) -> u64 {
        self.patch
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
