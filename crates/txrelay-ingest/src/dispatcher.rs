//! Validation and hand-off of raw candidates to the forward queue.

use std::path::Path;

use serde::Serialize;
use tokio::io::AsyncRead;
use tracing::{debug, info, warn};
use txrelay_core::{RecordError, ValidatedRecord};
use txrelay_delivery::ForwardQueue;

use crate::{
    error::Result,
    source::{read_file, spawn_line_reader, Termination},
};

/// What happened to a single candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Valid and queued for forwarding.
    Queued,
    /// Not a decodable record.
    Malformed,
    /// Decoded but failed field checks.
    Invalid,
    /// Valid, but the forward queue was already closed.
    Dropped,
}

/// Per-run counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    /// Records queued for forwarding.
    pub accepted: u64,
    /// Candidates that were not valid JSON records.
    pub malformed: u64,
    /// Records that failed validation.
    pub invalid: u64,
    /// Valid records lost because the queue had closed.
    pub dropped: u64,
}

impl DispatchSummary {
    /// Candidates seen in total.
    pub fn total(&self) -> u64 {
        self.accepted + self.malformed + self.invalid + self.dropped
    }

    /// Candidates that failed decoding or validation.
    pub fn rejected(&self) -> u64 {
        self.malformed + self.invalid
    }

    fn count(&mut self, outcome: DispatchOutcome) {
        let counter = match outcome {
            DispatchOutcome::Queued => &mut self.accepted,
            DispatchOutcome::Malformed => &mut self.malformed,
            DispatchOutcome::Invalid => &mut self.invalid,
            DispatchOutcome::Dropped => &mut self.dropped,
        };
        *counter += 1;
    }
}

/// Validates candidates and submits the valid ones for forwarding.
#[derive(Debug)]
pub struct Dispatcher {
    queue: ForwardQueue,
    summary: DispatchSummary,
}

impl Dispatcher {
    /// Creates a dispatcher feeding `queue`.
    pub fn new(queue: ForwardQueue) -> Self {
        Self { queue, summary: DispatchSummary::default() }
    }

    /// Counts so far.
    pub fn summary(&self) -> DispatchSummary {
        self.summary
    }

    /// Decodes and validates one candidate, queueing it if valid.
    ///
    /// Waits while the forward queue is full. Never fails: every problem
    /// is logged and reflected in the returned outcome.
    pub async fn dispatch(&mut self, raw: &[u8]) -> DispatchOutcome {
        let outcome = match ValidatedRecord::parse(raw) {
            Ok(record) => self.submit(record).await,
            Err(RecordError::Invalid(violations)) => {
                warn!(violations = %violations, "discarding invalid record");
                DispatchOutcome::Invalid
            },
            Err(e) => {
                warn!(error = %e, bytes = raw.len(), "discarding malformed record");
                DispatchOutcome::Malformed
            },
        };

        self.summary.count(outcome);
        outcome
    }

    async fn submit(&self, record: ValidatedRecord) -> DispatchOutcome {
        let tx_id = record.tx_id().to_string();
        match self.queue.submit(record).await {
            Ok(()) => {
                debug!(tx_id = %tx_id, "record queued for forwarding");
                DispatchOutcome::Queued
            },
            Err(e) => {
                warn!(tx_id = %tx_id, error = %e, "forward queue closed, record dropped");
                DispatchOutcome::Dropped
            },
        }
    }

    /// Reads one record from a file and dispatches it.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Io` if the file cannot be read; nothing is
    /// dispatched in that case.
    pub async fn run_file(&mut self, path: impl AsRef<Path>) -> Result<DispatchOutcome> {
        let path = path.as_ref();
        let contents = read_file(path).await?;
        let outcome = self.dispatch(&contents).await;
        info!(path = %path.display(), outcome = ?outcome, "file input processed");
        Ok(outcome)
    }

    /// Reads newline-delimited candidates from `input` until the sentinel,
    /// end of input, or a read error.
    pub async fn run_stream<R>(&mut self, input: R) -> Termination
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let handoff = spawn_line_reader(input);
        let reader = handoff.handle.abort_handle();
        let termination = self.run_handoff(handoff.candidates, handoff.termination).await;

        // Reader has already stopped unless the handoff broke
        reader.abort();
        termination
    }

    async fn run_handoff(
        &mut self,
        mut candidates: tokio::sync::mpsc::UnboundedReceiver<Vec<u8>>,
        mut termination: tokio::sync::oneshot::Receiver<Termination>,
    ) -> Termination {
        let mut candidates_open = true;

        loop {
            tokio::select! {
                biased;
                candidate = candidates.recv(), if candidates_open => match candidate {
                    Some(line) => {
                        self.dispatch(&line).await;
                    },
                    None => candidates_open = false,
                },
                reason = &mut termination => {
                    // Candidates sent before the signal are already buffered
                    while let Ok(line) = candidates.try_recv() {
                        self.dispatch(&line).await;
                    }
                    let reason = reason.unwrap_or(Termination::EndOfStream);
                    info!(reason = %reason, summary = ?self.summary, "stream ingestion finished");
                    return reason;
                },
            }
        }
    }
}
