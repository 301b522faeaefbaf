//! In-memory forwarder double.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use txrelay_core::ValidatedRecord;
use txrelay_delivery::{ForwardError, ForwardResponse, Forwarder, Result};

/// Forwarder that records every record it is handed.
///
/// Optionally sleeps per forward and tracks the highest number of forwards
/// that ran at once, so pool concurrency limits can be asserted.
#[derive(Debug, Default)]
pub struct RecordingForwarder {
    records: Mutex<Vec<ValidatedRecord>>,
    delay: Duration,
    fail: bool,
    current: AtomicUsize,
    max_concurrent: AtomicUsize,
}

impl RecordingForwarder {
    /// Creates a forwarder that succeeds immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a forwarder that takes `delay` per record.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay, ..Self::default() }
    }

    /// Creates a forwarder whose every attempt fails with a network error.
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    /// Records forwarded so far, in completion order.
    pub fn records(&self) -> Vec<ValidatedRecord> {
        self.records.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Number of forward attempts made.
    pub fn forward_count(&self) -> usize {
        self.records.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    /// Highest number of forwards observed running at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Forwarder for RecordingForwarder {
    async fn forward(&self, record: &ValidatedRecord) -> Result<ForwardResponse> {
        let running = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(running, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(record.clone());
        self.current.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            return Err(ForwardError::network("connection refused"));
        }

        Ok(ForwardResponse { status_code: 200, duration: self.delay, is_success: true })
    }
}
