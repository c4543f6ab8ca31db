//! In-process environment backed by an unbounded tokio channel.
//!
//! Outbound messages land on the receiver returned by
//! [`ChannelEnvironment::new`]. Every hook call is recorded so callers can
//! inspect what the adapter asked for.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::warn;

use crate::adapter::Environment;
use crate::protocol::Message;

/// Name reported by [`ChannelEnvironment`].
pub const CHANNEL_ENVIRONMENT: &str = "channel";

/// A resource the adapter asked to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedResource {
    /// File path or URL.
    pub file: String,
    /// Line number.
    pub line: u32,
}

/// Environment whose transport is a tokio mpsc channel.
#[derive(Debug)]
pub struct ChannelEnvironment {
    outbound: mpsc::UnboundedSender<Message>,
    can_open_resource: bool,
    mismatches: Mutex<Vec<String>>,
    opened: Mutex<Vec<OpenedResource>>,
    reloads: AtomicUsize,
}

impl ChannelEnvironment {
    /// Create the environment and the receiving end of its transport.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (outbound, inbox) = mpsc::unbounded_channel();
        let environment = Self {
            outbound,
            can_open_resource: false,
            mismatches: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
            reloads: AtomicUsize::new(0),
        };
        (environment, inbox)
    }

    /// Advertise the resource-opening capability.
    #[must_use]
    pub fn with_resource_opening(mut self) -> Self {
        self.can_open_resource = true;
        self
    }

    /// Every version passed to `on_version_mismatch`, in call order.
    pub fn mismatches(&self) -> Vec<String> {
        self.mismatches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent needed version, if a mismatch was reported.
    pub fn needed_version(&self) -> Option<String> {
        self.mismatches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Resources the adapter asked to open, in call order.
    pub fn opened_resources(&self) -> Vec<OpenedResource> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many reloads were requested.
    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl Environment for ChannelEnvironment {
    fn name(&self) -> &str {
        CHANNEL_ENVIRONMENT
    }

    fn send_message(&self, message: Message) {
        if self.outbound.send(message).is_err() {
            warn!(environment = CHANNEL_ENVIRONMENT, "receiver dropped, message discarded");
        }
    }

    fn on_version_mismatch(&self, needed_version: &str) {
        self.mismatches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(needed_version.to_owned());
    }

    fn will_reload(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }

    fn can_open_resource(&self) -> bool {
        self.can_open_resource
    }

    fn open_resource(&self, file: &str, line: u32) {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(OpenedResource {
                file: file.to_owned(),
                line,
            });
    }
}
