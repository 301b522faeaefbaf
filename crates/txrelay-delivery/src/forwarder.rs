//! Forwarding abstraction used by the worker pool.
//!
//! The pool only needs "send this record somewhere". Keeping that behind a
//! trait lets pool behavior (concurrency bound, draining, cancellation) be
//! tested with in-memory doubles instead of a live HTTP destination.

use std::fmt;

use txrelay_core::ValidatedRecord;

use crate::{client::ForwardResponse, error::Result};

/// Sends one validated record to its destination.
///
/// Implementations perform a single attempt. Retrying is deliberately not
/// part of the contract; the pool logs failures and moves on.
#[async_trait::async_trait]
pub trait Forwarder: Send + Sync + fmt::Debug {
    /// Forwards `record` once.
    async fn forward(&self, record: &ValidatedRecord) -> Result<ForwardResponse>;
}
