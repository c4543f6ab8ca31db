//! Version-mismatch classification.
//!
//! When the target reports `version-mismatch`, its version is placed against
//! the window this inspector build supports: too old means downgrading the
//! inspector to the newest previous release, at or past the upper bound means
//! upgrading to that bound.

use std::cmp::Ordering;

use tracing::{debug, info, warn};

use crate::protocol::{InboundMessage, Message};
use crate::version::{compare_version, VersionError};

use super::Environment;

/// The version window of the running inspector build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedVersionRange {
    /// Oldest target version this build supports (inclusive).
    pub from_version: String,
    /// First target version this build no longer supports (exclusive).
    pub till_version: Option<String>,
    /// Versions supported by earlier inspector releases, oldest first.
    pub previous_versions: Vec<String>,
}

impl SupportedVersionRange {
    /// Build a range without previous versions.
    pub fn new(from_version: impl Into<String>, till_version: Option<String>) -> Self {
        Self {
            from_version: from_version.into(),
            till_version,
            previous_versions: Vec::new(),
        }
    }

    /// Attach the previously supported versions, oldest first.
    #[must_use]
    pub fn with_previous_versions(mut self, previous_versions: Vec<String>) -> Self {
        self.previous_versions = previous_versions;
        self
    }
}

/// Outcome of placing a target version against a [`SupportedVersionRange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionDecision {
    /// Inside the window; nothing to do.
    Supported,
    /// Target is older than `from_version`; switch to an older inspector.
    Downgrade {
        /// Newest entry of `previous_versions`.
        needed_version: String,
    },
    /// Target is at or past `till_version`; switch to a newer inspector.
    Upgrade {
        /// The configured `till_version`.
        needed_version: String,
    },
    /// Target is too old but no previous release is known.
    Unresolvable,
}

impl VersionDecision {
    /// The version the inspector should switch to, if any.
    pub fn needed_version(&self) -> Option<&str> {
        match self {
            Self::Downgrade { needed_version } | Self::Upgrade { needed_version } => {
                Some(needed_version)
            }
            Self::Supported | Self::Unresolvable => None,
        }
    }
}

/// Classify `version` against `range`.
///
/// # Errors
///
/// Returns [`VersionError`] if `version` or one of the bounds does not parse.
pub fn classify(
    version: &str,
    range: &SupportedVersionRange,
) -> Result<VersionDecision, VersionError> {
    if compare_version(version, &range.from_version)? == Ordering::Less {
        return Ok(match range.previous_versions.last() {
            Some(needed) => VersionDecision::Downgrade {
                needed_version: needed.clone(),
            },
            None => VersionDecision::Unresolvable,
        });
    }

    if let Some(till) = &range.till_version {
        if compare_version(version, till)? != Ordering::Less {
            return Ok(VersionDecision::Upgrade {
                needed_version: till.clone(),
            });
        }
    }

    Ok(VersionDecision::Supported)
}

/// Internal listener body: react to a `version-mismatch` message.
///
/// Returns the version handed to [`Environment::on_version_mismatch`], if any.
pub(crate) fn handle_message<E>(
    environment: &E,
    range: &SupportedVersionRange,
    message: &Message,
) -> Option<String>
where
    E: Environment + ?Sized,
{
    let InboundMessage::VersionMismatch { version } = InboundMessage::parse(message) else {
        return None;
    };

    match classify(version, range) {
        Ok(VersionDecision::Supported) => {
            debug!(version, "target version within supported window");
            None
        }
        Ok(VersionDecision::Unresolvable) => {
            warn!(
                version,
                from_version = %range.from_version,
                "target older than supported window and no previous version is known"
            );
            None
        }
        Ok(
            VersionDecision::Downgrade { needed_version: needed }
            | VersionDecision::Upgrade { needed_version: needed },
        ) => {
            info!(
                version,
                needed_version = %needed,
                environment = environment.name(),
                "inspector version mismatch"
            );
            environment.on_version_mismatch(&needed);
            Some(needed)
        }
        Err(err) => {
            warn!(version, error = %err, "cannot compare target version, ignoring mismatch");
            None
        }
    }
}
