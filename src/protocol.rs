//! Messages exchanged between the inspector and the debugged target.
//!
//! Messages travel as free-form JSON values. The bridge only understands the
//! handful of shapes below; everything else is passed through untouched to
//! whoever registered a callback.

use serde::{Deserialize, Serialize};

/// A message on the wire, in either direction.
pub type Message = serde_json::Value;

/// Sender tag the inspector puts on its own requests.
pub const DEVTOOLS_SENDER: &str = "devtools";

/// `name` of the message a target sends when its instrumentation version
/// does not match what the inspector expects.
pub const VERSION_MISMATCH: &str = "version-mismatch";

/// Messages the inspector side originates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundMessage {
    /// Ask the target to report a version mismatch, if any.
    CheckVersion {
        /// Who is asking; always [`DEVTOOLS_SENDER`] for the bridge.
        from: String,
    },
    /// The inspector is about to reload.
    Reload,
    /// Ask the host to show `file` at `line`.
    OpenResource {
        /// Source file path or URL.
        file: String,
        /// One-based line number.
        line: u32,
    },
}

impl OutboundMessage {
    /// The startup `check-version` request.
    pub fn check_version() -> Self {
        Self::CheckVersion {
            from: DEVTOOLS_SENDER.to_owned(),
        }
    }

    /// Render as a wire message.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error; with string and integer fields only,
    /// none is expected.
    pub fn to_message(&self) -> Result<Message, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// The inbound shapes the bridge reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundMessage<'a> {
    /// `{ "name": "version-mismatch", "version": "..." }`
    VersionMismatch {
        /// Version the target's instrumentation reports.
        version: &'a str,
    },
    /// Anything else.
    Other,
}

impl<'a> InboundMessage<'a> {
    /// Classify an inbound message. Never fails; unknown shapes are
    /// [`InboundMessage::Other`].
    pub fn parse(message: &'a Message) -> Self {
        if message.get("name").and_then(Message::as_str) != Some(VERSION_MISMATCH) {
            return Self::Other;
        }
        match message.get("version").and_then(Message::as_str) {
            Some(version) => Self::VersionMismatch { version },
            None => {
                tracing::debug!("version-mismatch message without a string version");
                Self::Other
            }
        }
    }
}
