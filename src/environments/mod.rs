//! Concrete host environments.
//!
//! - [`channel::ChannelEnvironment`]: in-process, backed by a tokio channel;
//!   used by tests and by embedders that own both ends.
//! - [`stdio::StdioEnvironment`]: newline-delimited JSON over stdout, the
//!   transport behind the `host` subcommand.
//!
//! [`crate::adapter::BasicEnvironment`] lives next to the trait it defaults.

pub mod channel;
pub mod stdio;
