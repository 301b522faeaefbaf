//! txrelay configuration and HTTP surface.
//!
//! The HTTP server is independent of the relay path: it answers health
//! probes and accepts (and discards) anything posted to `/`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::{sync::Arc, time::Instant};

use txrelay_delivery::ForwardStats;

pub mod config;
pub mod handlers;
pub mod server;

pub use config::{Config, InputMode};
pub use server::{create_router, serve, start_server};

/// Shared state for HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Forward counters reported by `/health`.
    pub stats: Arc<ForwardStats>,
    /// When the process started.
    pub started_at: Instant,
}

impl AppState {
    /// Creates handler state reporting the given forward stats.
    pub fn new(stats: Arc<ForwardStats>) -> Self {
        Self { stats, started_at: Instant::now() }
    }
}
