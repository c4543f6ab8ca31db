//! Stdio environment: the inspector side of a newline-delimited JSON pipe.
//!
//! Outbound messages go to an unbounded channel drained by
//! [`crate::transport::spawn_writer`]. Stdout is the wire, so anything this
//! environment launches gets its stdio detached.

use std::process::Stdio;
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::adapter::Environment;
use crate::protocol::{Message, OutboundMessage};

/// Placeholder replaced by the file path in editor arguments.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Placeholder replaced by the line number in editor arguments.
pub const LINE_PLACEHOLDER: &str = "{line}";

/// External editor used to open source locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorCommand {
    /// Program to run.
    pub program: String,
    /// Arguments; may contain [`FILE_PLACEHOLDER`] and [`LINE_PLACEHOLDER`].
    pub args: Vec<String>,
}

impl EditorCommand {
    /// Create an editor command.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Arguments with placeholders substituted. Without any argument the
    /// location is passed as a single `file:line` argument.
    pub fn render_args(&self, file: &str, line: u32) -> Vec<String> {
        if self.args.is_empty() {
            return vec![format!("{file}:{line}")];
        }
        let line = line.to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(FILE_PLACEHOLDER, file)
                    .replace(LINE_PLACEHOLDER, &line)
            })
            .collect()
    }
}

/// Environment speaking JSON lines over the process's stdio.
#[derive(Debug)]
pub struct StdioEnvironment {
    name: String,
    outbound: mpsc::UnboundedSender<Message>,
    editor: Option<EditorCommand>,
    needed_version: Mutex<Option<String>>,
}

impl StdioEnvironment {
    /// Create the environment over an outbound channel.
    pub fn new(
        name: impl Into<String>,
        outbound: mpsc::UnboundedSender<Message>,
        editor: Option<EditorCommand>,
    ) -> Self {
        Self {
            name: name.into(),
            outbound,
            editor,
            needed_version: Mutex::new(None),
        }
    }

    /// The inspector version the target asked for, if any.
    pub fn needed_version(&self) -> Option<String> {
        self.needed_version
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn send_outbound(&self, message: &OutboundMessage) {
        match message.to_message() {
            Ok(message) => self.send_message(message),
            Err(e) => warn!(
                environment = %self.name,
                error = %e,
                "failed to encode outbound message"
            ),
        }
    }

    fn launch_editor(&self, editor: &EditorCommand, file: &str, line: u32) {
        // tokio's process driver needs a runtime to reap the child.
        if tokio::runtime::Handle::try_current().is_err() {
            warn!(program = %editor.program, "no tokio runtime, cannot launch editor");
            return;
        }

        let spawned = tokio::process::Command::new(&editor.program)
            .args(editor.render_args(file, line))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => info!(
                program = %editor.program,
                pid = child.id(),
                file,
                line,
                "opened resource in editor"
            ),
            Err(e) => warn!(program = %editor.program, error = %e, "failed to launch editor"),
        }
    }
}

impl Environment for StdioEnvironment {
    fn name(&self) -> &str {
        &self.name
    }

    fn send_message(&self, message: Message) {
        if self.outbound.send(message).is_err() {
            warn!(environment = %self.name, "stdout writer stopped, message discarded");
        }
    }

    fn on_version_mismatch(&self, needed_version: &str) {
        warn!(
            environment = %self.name,
            needed_version,
            "target requires a different inspector version"
        );
        *self
            .needed_version
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(needed_version.to_owned());
    }

    fn will_reload(&self) {
        self.send_outbound(&OutboundMessage::Reload);
    }

    fn can_open_resource(&self) -> bool {
        self.editor.is_some()
    }

    fn open_resource(&self, file: &str, line: u32) {
        match &self.editor {
            Some(editor) => self.launch_editor(editor, file, line),
            None => self.send_outbound(&OutboundMessage::OpenResource {
                file: file.to_owned(),
                line,
            }),
        }
    }
}
