//! Newline-delimited JSON transport.
//!
//! One JSON value per line in both directions. The reader side feeds an
//! [`Adapter`]; the writer side drains the channel an environment sends into.

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::adapter::{Adapter, Environment};
use crate::protocol::Message;

/// Longest accepted inbound line, newline included.
pub const MAX_LINE_BYTES: u64 = 1_048_576;

/// Errors from the line transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading or writing the underlying stream failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line was not valid JSON.
    #[error("transport JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A line exceeded [`MAX_LINE_BYTES`]; the stream can no longer be
    /// framed.
    #[error("inbound line exceeds {limit} bytes")]
    TooLarge {
        /// The limit that was hit.
        limit: u64,
    },
}

/// Serialize `message` as one line, trailing newline included.
///
/// # Errors
///
/// Returns [`TransportError::Json`] if serialization fails.
pub fn encode_line(message: &Message) -> Result<Vec<u8>, TransportError> {
    let mut bytes = serde_json::to_vec(message)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Reads one JSON value per line from an async stream.
pub struct LineReader<R> {
    reader: BufReader<R>,
    line: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Wrap `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line: Vec::new(),
        }
    }

    /// Read the next message, skipping blank lines. `Ok(None)` at EOF.
    ///
    /// # Errors
    ///
    /// [`TransportError::Json`] for a malformed line, invalid UTF-8 included
    /// (the line is consumed, reading may continue);
    /// [`TransportError::TooLarge`] and [`TransportError::Io`] leave the
    /// stream unusable.
    pub async fn next_message(&mut self) -> Result<Option<Message>, TransportError> {
        loop {
            self.line.clear();
            let read = (&mut self.reader)
                .take(MAX_LINE_BYTES)
                .read_until(b'\n', &mut self.line)
                .await?;
            if read == 0 {
                return Ok(None);
            }
            if !self.line.ends_with(b"\n") {
                // Without a newline the line either ended at EOF or was cut
                // by the limit; only the latter leaves bytes behind.
                let at_limit = u64::try_from(read).map_or(true, |n| n >= MAX_LINE_BYTES);
                if at_limit && !self.reader.fill_buf().await?.is_empty() {
                    return Err(TransportError::TooLarge {
                        limit: MAX_LINE_BYTES,
                    });
                }
            }

            let trimmed = self.line.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }
            return Ok(Some(serde_json::from_slice(trimmed)?));
        }
    }
}

/// Spawn a task writing every message sent on the returned channel to
/// `writer`, one line each, flushing after every line.
///
/// The task ends when every sender is dropped or a write fails.
pub fn spawn_writer<W>(
    writer: W,
) -> (
    mpsc::UnboundedSender<Message>,
    JoinHandle<Result<(), TransportError>>,
)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let handle = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(message) = rx.recv().await {
            let line = match encode_line(&message) {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "dropping unencodable outbound message");
                    continue;
                }
            };
            writer.write_all(&line).await?;
            writer.flush().await?;
        }
        debug!("outbound channel closed, writer stopping");
        Ok::<(), TransportError>(())
    });
    (tx, handle)
}

/// Counters from a [`pump`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Messages dispatched to the adapter.
    pub messages: usize,
    /// Lines skipped because they were not valid UTF-8 JSON.
    pub malformed: usize,
    /// Callback failures reported by the adapter.
    pub callback_failures: usize,
}

/// Read messages from `reader` until EOF and dispatch each one through
/// `adapter`. Malformed lines are logged and skipped.
///
/// # Errors
///
/// Returns [`TransportError::Io`] or [`TransportError::TooLarge`] when the
/// stream breaks.
pub async fn pump<R, E>(reader: R, adapter: &Adapter<E>) -> Result<PumpStats, TransportError>
where
    R: AsyncRead + Unpin,
    E: Environment + ?Sized + 'static,
{
    let mut lines = LineReader::new(reader);
    let mut stats = PumpStats::default();

    loop {
        let message = match lines.next_message().await {
            Ok(Some(message)) => message,
            Ok(None) => break,
            Err(TransportError::Json(e)) => {
                warn!(error = %e, "skipping malformed inbound line");
                stats.malformed = stats.malformed.saturating_add(1);
                continue;
            }
            Err(e) => return Err(e),
        };

        let report = adapter.dispatch_message(&message);
        stats.messages = stats.messages.saturating_add(1);
        stats.callback_failures = stats
            .callback_failures
            .saturating_add(report.failures.len());
    }

    debug!(
        messages = stats.messages,
        malformed = stats.malformed,
        "inbound stream closed"
    );
    Ok(stats)
}
