//! Bounded forward queue drained by a fixed pool of workers.
//!
//! Workers share one queue receiver behind an async mutex; whichever worker
//! is idle takes the next record. Graceful shutdown stops intake, lets
//! workers drain what is already queued, and cancels them if the drain
//! outlives its timeout.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use serde::Serialize;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use txrelay_core::ValidatedRecord;

use crate::{
    error::{ForwardError, Result},
    forwarder::Forwarder,
};

/// Sizing for the forward pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of concurrent forward workers.
    pub worker_count: usize,
    /// Records the queue holds before `submit` waits.
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: crate::DEFAULT_WORKER_COUNT,
            queue_capacity: crate::DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Lock-free forward counters shared by the queue and workers.
#[derive(Debug, Default)]
pub struct ForwardStats {
    submitted: AtomicU64,
    delivered: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
    in_flight: AtomicU64,
}

/// Point-in-time copy of [`ForwardStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Records accepted into the queue.
    pub submitted: u64,
    /// Forwards answered with a 2xx status.
    pub delivered: u64,
    /// Forwards answered with a non-2xx status.
    pub rejected: u64,
    /// Forwards that never got a response.
    pub failed: u64,
    /// Forwards currently in progress.
    pub in_flight: u64,
}

impl StatsSnapshot {
    /// Forwards that finished, successfully or not.
    pub fn completed(&self) -> u64 {
        self.delivered + self.rejected + self.failed
    }
}

impl ForwardStats {
    /// Returns a consistent-enough copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
        }
    }

    fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    fn record_started(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    fn record_finished(&self, outcome: &Result<crate::ForwardResponse>) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
        let counter = match outcome {
            Ok(response) if response.is_success => &self.delivered,
            Ok(_) => &self.rejected,
            Err(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Cloneable handle for submitting records to a [`ForwardPool`].
#[derive(Debug, Clone)]
pub struct ForwardQueue {
    sender: mpsc::Sender<ValidatedRecord>,
    closing: CancellationToken,
    stats: Arc<ForwardStats>,
}

impl ForwardQueue {
    /// Queues a record for forwarding, waiting while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns `ForwardError::QueueClosed` once the pool has begun shutting
    /// down; the record is dropped.
    pub async fn submit(&self, record: ValidatedRecord) -> Result<()> {
        if self.closing.is_cancelled() {
            return Err(ForwardError::QueueClosed);
        }

        tokio::select! {
            biased;
            () = self.closing.cancelled() => return Err(ForwardError::QueueClosed),
            sent = self.sender.send(record) => sent.map_err(|_| ForwardError::QueueClosed)?,
        }

        self.stats.record_submitted();
        Ok(())
    }

    /// Free slots currently available in the queue.
    pub fn available_capacity(&self) -> usize {
        self.sender.capacity()
    }

    /// Total queue capacity.
    pub fn max_capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}

/// Fixed-size pool of forward workers fed by a bounded queue.
pub struct ForwardPool {
    config: PoolConfig,
    forwarder: Arc<dyn Forwarder>,
    stats: Arc<ForwardStats>,
    cancellation_token: CancellationToken,
    closing: CancellationToken,
    sender: mpsc::Sender<ValidatedRecord>,
    receiver: Arc<Mutex<mpsc::Receiver<ValidatedRecord>>>,
    worker_handles: Vec<JoinHandle<()>>,
}

impl ForwardPool {
    /// Creates a pool; no workers run until [`spawn_workers`](Self::spawn_workers).
    ///
    /// Cancelling `cancellation_token` stops workers immediately, abandoning
    /// queued and in-flight forwards.
    pub fn new(
        config: PoolConfig,
        forwarder: Arc<dyn Forwarder>,
        cancellation_token: CancellationToken,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));

        Self {
            config,
            forwarder,
            stats: Arc::new(ForwardStats::default()),
            cancellation_token,
            closing: CancellationToken::new(),
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            worker_handles: Vec::new(),
        }
    }

    /// Returns a handle for submitting records.
    pub fn queue(&self) -> ForwardQueue {
        ForwardQueue {
            sender: self.sender.clone(),
            closing: self.closing.clone(),
            stats: self.stats.clone(),
        }
    }

    /// Shared forward counters.
    pub fn stats(&self) -> Arc<ForwardStats> {
        self.stats.clone()
    }

    /// Spawns all configured workers. Calling it again is a no-op.
    pub fn spawn_workers(&mut self) {
        if !self.worker_handles.is_empty() {
            return;
        }

        info!(
            worker_count = self.config.worker_count,
            queue_capacity = self.config.queue_capacity,
            "spawning forward workers"
        );

        for worker_id in 0..self.config.worker_count {
            let worker = ForwardWorker {
                id: worker_id,
                forwarder: self.forwarder.clone(),
                receiver: self.receiver.clone(),
                stats: self.stats.clone(),
                closing: self.closing.clone(),
                cancellation_token: self.cancellation_token.clone(),
            };

            self.worker_handles.push(tokio::spawn(worker.run()));
        }
    }

    /// Stops intake and waits for workers to drain the queue.
    ///
    /// # Errors
    ///
    /// Returns `ForwardError::ShutdownTimeout` if workers are still busy
    /// after `timeout`; they are cancelled before returning.
    pub async fn shutdown_graceful(mut self, timeout: Duration) -> Result<()> {
        info!(
            worker_count = self.worker_handles.len(),
            timeout_seconds = timeout.as_secs(),
            "initiating graceful forward pool shutdown"
        );

        self.closing.cancel();

        let handles = std::mem::take(&mut self.worker_handles);
        let join_all = async {
            let mut panics = Vec::new();
            for (worker_id, handle) in handles.into_iter().enumerate() {
                if let Err(join_error) = handle.await {
                    error!(worker_id, error = %join_error, "forward worker panicked");
                    panics.push(ForwardError::WorkerPanic {
                        worker_id,
                        error: join_error.to_string(),
                    });
                }
            }
            panics
        };

        match tokio::time::timeout(timeout, join_all).await {
            Ok(panics) => {
                if !panics.is_empty() {
                    warn!(panicked = panics.len(), "some forward workers panicked");
                }
            },
            Err(_elapsed) => {
                error!(
                    timeout_seconds = timeout.as_secs(),
                    "forward workers did not drain in time, cancelling"
                );
                self.cancellation_token.cancel();
                return Err(ForwardError::ShutdownTimeout { timeout });
            },
        }

        let abandoned = self.drain_abandoned().await;
        if abandoned > 0 {
            warn!(abandoned, "records left in queue after shutdown were dropped");
        }

        info!(stats = ?self.stats.snapshot(), "forward pool shutdown completed");
        Ok(())
    }

    /// Returns true if any worker is still running.
    pub fn has_active_workers(&self) -> bool {
        self.worker_handles.iter().any(|h| !h.is_finished())
    }

    async fn drain_abandoned(&self) -> usize {
        let mut receiver = self.receiver.lock().await;
        receiver.close();
        let mut abandoned = 0;
        while receiver.try_recv().is_ok() {
            abandoned += 1;
        }
        abandoned
    }
}

impl Drop for ForwardPool {
    fn drop(&mut self) {
        let active = self.worker_handles.iter().filter(|h| !h.is_finished()).count();

        if active > 0 && !self.cancellation_token.is_cancelled() {
            error!(
                active_workers = active,
                "ForwardPool dropped with active workers, cancelling to avoid orphaned tasks"
            );
            self.closing.cancel();
            self.cancellation_token.cancel();
        }
    }
}

struct ForwardWorker {
    id: usize,
    forwarder: Arc<dyn Forwarder>,
    receiver: Arc<Mutex<mpsc::Receiver<ValidatedRecord>>>,
    stats: Arc<ForwardStats>,
    closing: CancellationToken,
    cancellation_token: CancellationToken,
}

impl ForwardWorker {
    async fn run(self) {
        debug!(worker_id = self.id, "forward worker starting");

        while let Some(record) = self.next_record().await {
            self.stats.record_started();

            let outcome = tokio::select! {
                biased;
                () = self.cancellation_token.cancelled() => {
                    warn!(worker_id = self.id, tx_id = %record.tx_id(), "forward abandoned on cancellation");
                    self.stats.record_finished(&Err(ForwardError::QueueClosed));
                    break;
                },
                outcome = self.forwarder.forward(&record) => outcome,
            };

            if let Err(ref e) = outcome {
                warn!(
                    worker_id = self.id,
                    tx_id = %record.tx_id(),
                    category = %e.category(),
                    error = %e,
                    "forward failed, record dropped"
                );
            }

            self.stats.record_finished(&outcome);
        }

        debug!(worker_id = self.id, "forward worker stopped");
    }

    /// Next queued record, or `None` once the pool is cancelled or closing
    /// with nothing left to drain.
    async fn next_record(&self) -> Option<ValidatedRecord> {
        let mut receiver = tokio::select! {
            biased;
            () = self.cancellation_token.cancelled() => return None,
            guard = self.receiver.lock() => guard,
        };

        tokio::select! {
            biased;
            () = self.cancellation_token.cancelled() => None,
            record = receiver.recv() => record,
            () = self.closing.cancelled() => receiver.try_recv().ok(),
        }
    }
}
