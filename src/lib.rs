//! Inspector bridge: environment adapter for a debugging inspector.
//!
//! The inspector talks to a debug counterpart embedded in the running
//! application. This crate keeps the inspector agnostic of where it runs:
//! an [`adapter::Environment`] supplies the transport and host actions, and
//! the [`adapter::Adapter`] dispatches inbound messages and negotiates the
//! instrumentation version at startup.
//!
//! See `DESIGN.md` for the module map.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod config;
pub mod environments;
pub mod logging;
pub mod protocol;
pub mod transport;
pub mod version;
