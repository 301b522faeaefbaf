//! Delivery of validated transaction records to the downstream endpoint.
//!
//! # Architecture
//!
//! Ingestion never talks to the network directly. Validated records are
//! submitted to a bounded [`ForwardQueue`]; a fixed set of workers owned by
//! a [`ForwardPool`] drains it and hands each record to a [`Forwarder`].
//! The production forwarder is [`ForwardClient`], which issues one
//! Basic-authenticated POST per record and discards the response body.
//!
//! A full queue makes `submit` wait, so a slow destination slows ingestion
//! instead of piling up unbounded in-flight requests. Failed forwards are
//! logged and counted, never retried.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tokio_util::sync::CancellationToken;
//! use txrelay_core::ValidatedRecord;
//! use txrelay_delivery::{ForwardClient, ForwardPool, PoolConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(ForwardClient::with_defaults()?);
//! let mut pool = ForwardPool::new(PoolConfig::default(), client, CancellationToken::new());
//! pool.spawn_workers();
//!
//! let record = ValidatedRecord::parse(
//!     br#"{"TxId":"1","TxType":"A","Result":"OK","Resultcode":"0"}"#,
//! )?;
//! pool.queue().submit(record).await?;
//!
//! pool.shutdown_graceful(std::time::Duration::from_secs(5)).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod forwarder;
pub mod worker_pool;

pub use client::{basic_auth_header, ClientConfig, ForwardClient, ForwardResponse};
pub use error::{ErrorCategory, ForwardError, Result};
pub use forwarder::Forwarder;
pub use worker_pool::{ForwardPool, ForwardQueue, ForwardStats, PoolConfig, StatsSnapshot};

/// Destination used when none is configured.
pub const DEFAULT_DESTINATION_URL: &str = "http://localhost:8080/";

/// Default number of concurrent forward workers.
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Default number of records the forward queue holds before `submit` waits.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default outbound request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
