//! Environment adapter: the seam between the inspector and its host.
//!
//! An [`Environment`] supplies the host-specific capabilities (sending to
//! the target, reacting to a version mismatch, reloading, opening source
//! files). The [`Adapter`] wraps one environment, owns the list of inbound
//! message callbacks, and performs the `check-version` handshake when it
//! is built.
//!
//! Every environment hook has a no-op default, so a host only overrides what
//! it actually supports. [`BasicEnvironment`] overrides nothing.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error};

use crate::protocol::{Message, OutboundMessage};

pub mod handshake;

pub use handshake::{classify, SupportedVersionRange, VersionDecision};

/// Name reported by environments that do not override [`Environment::name`].
pub const BASIC_ENVIRONMENT: &str = "basic";

// ---------------------------------------------------------------------------
// Environment trait
// ---------------------------------------------------------------------------

/// Host capabilities an [`Adapter`] delegates to.
///
/// Implementations must be `Send + Sync`: the adapter may be shared across
/// tasks, and the internal handshake listener holds the environment.
pub trait Environment: Send + Sync {
    /// Identifier of the concrete environment.
    fn name(&self) -> &str {
        BASIC_ENVIRONMENT
    }

    /// Deliver `message` to the debugged target. Fire-and-forget: delivery
    /// failures are the environment's to log.
    fn send_message(&self, _message: Message) {}

    /// The target needs a different inspector build, `needed_version`.
    fn on_version_mismatch(&self, _needed_version: &str) {}

    /// The user asked for a reload.
    fn will_reload(&self) {}

    /// Whether [`Environment::open_resource`] does anything.
    fn can_open_resource(&self) -> bool {
        false
    }

    /// Show `file` at `line` in a native tool.
    fn open_resource(&self, _file: &str, _line: u32) {}
}

/// Environment with every hook left at its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicEnvironment;

impl Environment for BasicEnvironment {}

// ---------------------------------------------------------------------------
// Dispatch results
// ---------------------------------------------------------------------------

/// Callback invoked for every inbound message.
pub type MessageCallback = Arc<dyn Fn(&Message) -> anyhow::Result<()> + Send + Sync>;

/// Why a callback did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackError {
    /// The callback returned an error.
    #[error("callback {index} failed: {message}")]
    Failed {
        /// Registration index of the callback.
        index: usize,
        /// Rendered error chain.
        message: String,
    },
    /// The callback panicked.
    #[error("callback {index} panicked: {message}")]
    Panicked {
        /// Registration index of the callback.
        index: usize,
        /// Panic payload, when it was a string.
        message: String,
    },
}

/// Summary of one [`Adapter::dispatch_message`] call.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Number of callbacks invoked.
    pub invoked: usize,
    /// Callbacks that failed, in invocation order.
    pub failures: Vec<CallbackError>,
}

impl DispatchReport {
    /// True when every callback completed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// One inspector session's connection to its host environment.
pub struct Adapter<E: Environment + ?Sized> {
    environment: Arc<E>,
    callbacks: Mutex<Vec<MessageCallback>>,
}

impl<E: Environment + 'static> Adapter<E> {
    /// Build an adapter over `environment` and run the handshake.
    pub fn new(environment: E, range: SupportedVersionRange) -> Self {
        Self::from_shared(Arc::new(environment), range)
    }
}

impl<E: Environment + ?Sized + 'static> Adapter<E> {
    /// Build an adapter over an environment the caller keeps a handle to,
    /// and run the handshake.
    pub fn from_shared(environment: Arc<E>, range: SupportedVersionRange) -> Self {
        let adapter = Self {
            environment,
            callbacks: Mutex::new(Vec::new()),
        };
        adapter.initialize(range);
        adapter
    }

    /// Register the version-check listener, then ask the target for its
    /// version. The order matters: a reply must find the listener in place.
    fn initialize(&self, range: SupportedVersionRange) {
        let environment = Arc::clone(&self.environment);
        self.on_message_received(move |message| {
            handshake::handle_message(environment.as_ref(), &range, message);
            Ok(())
        });

        debug!(environment = self.name(), "sending check-version");
        match OutboundMessage::check_version().to_message() {
            Ok(message) => self.environment.send_message(message),
            Err(e) => error!(error = %e, "failed to encode check-version request"),
        }
    }

    /// Name of the wrapped environment.
    pub fn name(&self) -> &str {
        self.environment.name()
    }

    /// The wrapped environment.
    pub fn environment(&self) -> &E {
        &self.environment
    }

    /// Send `message` to the target through the environment.
    pub fn send_message(&self, message: Message) {
        self.environment.send_message(message);
    }

    /// Register `callback` for every future inbound message.
    ///
    /// Callbacks are never invoked during registration, are never removed,
    /// and run in registration order.
    pub fn on_message_received<F>(&self, callback: F)
    where
        F: Fn(&Message) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.lock_callbacks().push(Arc::new(callback));
    }

    /// Number of registered callbacks, including the internal listener.
    pub fn callback_count(&self) -> usize {
        self.lock_callbacks().len()
    }

    /// Hand an inbound `message` to every registered callback, in order.
    ///
    /// Each callback is guarded on its own: an error or a panic is logged and
    /// recorded in the returned report, and the remaining callbacks still run.
    /// Callbacks registered while dispatching see the next message, not this
    /// one.
    pub fn dispatch_message(&self, message: &Message) -> DispatchReport {
        let snapshot: Vec<MessageCallback> = self.lock_callbacks().clone();
        let mut report = DispatchReport {
            invoked: snapshot.len(),
            failures: Vec::new(),
        };

        for (index, callback) in snapshot.iter().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback(message)));
            let failure = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => CallbackError::Failed {
                    index,
                    message: format!("{err:#}"),
                },
                Err(payload) => CallbackError::Panicked {
                    index,
                    message: panic_message(payload.as_ref()),
                },
            };
            error!(environment = self.name(), error = %failure, "message callback failed");
            report.failures.push(failure);
        }

        report
    }

    /// Forward a reload request to the environment.
    pub fn will_reload(&self) {
        self.environment.will_reload();
    }

    /// Whether the environment can open source files.
    pub fn can_open_resource(&self) -> bool {
        self.environment.can_open_resource()
    }

    /// Ask the environment to open `file` at `line`. Ignored when the
    /// environment lacks the capability.
    pub fn open_resource(&self, file: &str, line: u32) {
        if !self.can_open_resource() {
            debug!(environment = self.name(), file, line, "environment cannot open resources");
            return;
        }
        self.environment.open_resource(file, line);
    }

    fn lock_callbacks(&self) -> std::sync::MutexGuard<'_, Vec<MessageCallback>> {
        // Callbacks run outside the lock, so poisoning can only come from a
        // panicking push; the vector is still consistent.
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
