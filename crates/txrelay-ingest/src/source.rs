//! Raw record sources: a whole file, or a newline-delimited stream.
//!
//! The stream reader runs as its own task and hands lines to the
//! dispatcher over an unbounded channel. Why it stopped is reported once,
//! on a separate oneshot channel, after every candidate has been sent.

use std::{fmt, path::Path};

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, error, info};

use crate::error::{IngestError, Result};

/// Line that ends stream ingestion.
///
/// Matched exactly after line-ending normalization. There is no escape; a
/// record line is always a JSON object, so it never collides.
pub const SENTINEL: &[u8] = b"done";

/// Reads a whole input file.
///
/// # Errors
///
/// Returns `IngestError::Io` if the file cannot be opened or read.
pub async fn read_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let contents = tokio::fs::read(path).await.map_err(|e| IngestError::io(path, e))?;
    debug!(path = %path.display(), bytes = contents.len(), "read input file");
    Ok(contents)
}

/// Classification of one normalized input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// The sentinel; reading stops.
    Sentinel,
    /// Empty or whitespace-only; skipped.
    Blank,
    /// Anything else; handed on for decoding. Not necessarily UTF-8.
    Candidate(&'a [u8]),
}

/// Strips one trailing `\n` and then one trailing `\r`, and classifies the
/// result.
///
/// ```
/// use txrelay_ingest::{classify_line, Line};
///
/// assert_eq!(classify_line(b"done\r\n"), Line::Sentinel);
/// assert_eq!(classify_line(b"  \n"), Line::Blank);
/// assert_eq!(classify_line(b"{}\n"), Line::Candidate(b"{}"));
/// ```
pub fn classify_line(raw: &[u8]) -> Line<'_> {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    if line == SENTINEL {
        Line::Sentinel
    } else if line.iter().all(u8::is_ascii_whitespace) {
        Line::Blank
    } else {
        Line::Candidate(line)
    }
}

/// Why the stream reader stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The sentinel line was read.
    Sentinel,
    /// The input ended, or the reader went away without saying why.
    EndOfStream,
    /// Reading failed; carries the error message.
    ReadError(String),
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sentinel => write!(f, "sentinel"),
            Self::EndOfStream => write!(f, "end of stream"),
            Self::ReadError(message) => write!(f, "read error: {message}"),
        }
    }
}

/// Buffered line reader over any async byte source.
pub struct LineReader<R> {
    reader: BufReader<R>,
    buffer: Vec<u8>,
    lines_read: u64,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Wraps a byte source.
    pub fn new(inner: R) -> Self {
        Self { reader: BufReader::new(inner), buffer: Vec::new(), lines_read: 0 }
    }

    /// Reads the next raw line, including its terminator if one was present.
    ///
    /// Returns `Ok(None)` at end of input. Bytes are passed through as-is;
    /// a line that is not UTF-8 is left for the decoder to reject.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying source.
    pub async fn next_line(&mut self) -> std::io::Result<Option<&[u8]>> {
        self.buffer.clear();
        let read = self.reader.read_until(b'\n', &mut self.buffer).await?;
        if read == 0 {
            return Ok(None);
        }
        self.lines_read += 1;
        Ok(Some(&self.buffer))
    }

    /// Lines read so far.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Reads until the sentinel, end of input, or a read error, sending
    /// each candidate line to `candidates`.
    pub async fn forward_candidates(
        &mut self,
        candidates: &mpsc::UnboundedSender<Vec<u8>>,
    ) -> Termination {
        loop {
            let line_number = self.lines_read + 1;
            let raw = match self.next_line().await {
                Ok(Some(raw)) => raw,
                Ok(None) => return Termination::EndOfStream,
                Err(e) => {
                    error!(error = %e, line = line_number, "failed to read input line");
                    return Termination::ReadError(e.to_string());
                },
            };

            match classify_line(raw) {
                Line::Sentinel => return Termination::Sentinel,
                Line::Blank => debug!(line = line_number, "skipping blank line"),
                Line::Candidate(candidate) => {
                    if candidates.send(candidate.to_vec()).is_err() {
                        debug!("candidate receiver dropped, stopping reader");
                        return Termination::EndOfStream;
                    }
                },
            }
        }
    }
}

/// Receiving side of a running stream reader.
pub struct LineHandoff {
    /// Candidate lines, in input order.
    pub candidates: mpsc::UnboundedReceiver<Vec<u8>>,
    /// Fires once the reader stops.
    pub termination: oneshot::Receiver<Termination>,
    /// Reader task.
    pub handle: JoinHandle<()>,
}

/// Spawns a task that reads lines from `input` until it terminates.
pub fn spawn_line_reader<R>(input: R) -> LineHandoff
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (candidate_tx, candidates) = mpsc::unbounded_channel();
    let (termination_tx, termination) = oneshot::channel();

    let handle = tokio::spawn(async move {
        let mut reader = LineReader::new(input);
        let reason = reader.forward_candidates(&candidate_tx).await;

        info!(lines_read = reader.lines_read(), reason = %reason, "stream reader stopped");

        // Dispatcher may already be gone
        let _ = termination_tx.send(reason);
    });

    LineHandoff { candidates, termination, handle }
}
