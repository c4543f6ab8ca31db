//! Semantic-version comparison used by the inspector handshake.
//!
//! Only `major.minor.patch` takes part in ordering. Anything after the first
//! `-` (pre-release tags, build metadata) is dropped before parsing, so
//! `2.5.0-beta.1` and `2.5.0` compare equal.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Errors produced while parsing a version string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// Nothing left to parse once the pre-release suffix was stripped.
    #[error("empty version string: {0:?}")]
    Empty(String),

    /// A component is not a non-negative integer.
    #[error("invalid {component} component {value:?} in version {input:?}")]
    InvalidComponent {
        /// The full input as given.
        input: String,
        /// Which component failed (`major`, `minor` or `patch`).
        component: &'static str,
        /// The offending text.
        value: String,
    },
}

/// A parsed `major.minor.patch` triple.
///
/// Field order matters: the derived [`Ord`] compares major, then minor,
/// then patch, which is exactly the component-wise ordering the handshake
/// relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionTuple {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
}

impl VersionTuple {
    /// Build a tuple from its components.
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string.
    ///
    /// A leading `v` is accepted (`v1.2.3`). Missing minor/patch components
    /// are `0`; components after the patch are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError`] when the string is empty or a component is
    /// not a non-negative integer.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let core = strip_prerelease(input).trim();
        let core = core.strip_prefix('v').unwrap_or(core);
        if core.is_empty() {
            return Err(VersionError::Empty(input.to_owned()));
        }

        let mut parts = core.split('.');
        let major = parse_component(input, "major", parts.next())?;
        let minor = parse_component(input, "minor", parts.next())?;
        let patch = parse_component(input, "patch", parts.next())?;

        Ok(Self::new(major, minor, patch))
    }
}

impl FromStr for VersionTuple {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Compare two version strings by their numeric `major.minor.patch`.
///
/// # Errors
///
/// Returns [`VersionError`] if either side fails to parse.
pub fn compare_version(v1: &str, v2: &str) -> Result<Ordering, VersionError> {
    let left = VersionTuple::parse(v1)?;
    let right = VersionTuple::parse(v2)?;
    Ok(left.cmp(&right))
}

fn strip_prerelease(input: &str) -> &str {
    input.split_once('-').map_or(input, |(core, _)| core)
}

fn parse_component(
    input: &str,
    component: &'static str,
    raw: Option<&str>,
) -> Result<u64, VersionError> {
    let Some(raw) = raw else {
        return Ok(0);
    };
    // `u64::from_str` tolerates a leading `+`; versions never carry one.
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionError::InvalidComponent {
            input: input.to_owned(),
            component,
            value: raw.to_owned(),
        });
    }
    raw.parse().map_err(|_| VersionError::InvalidComponent {
        input: input.to_owned(),
        component,
        value: raw.to_owned(),
    })
}
