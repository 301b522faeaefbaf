//! txrelay transaction-result relay.
//!
//! Main entry point. Reads records from stdin or a file, validates them,
//! and forwards valid ones to the configured destination with Basic auth.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use txrelay_api::{AppState, Config, InputMode};
use txrelay_delivery::{ForwardClient, ForwardPool};
use txrelay_ingest::Dispatcher;

/// Time allowed for blocking tasks (a pending stdin read) once the relay
/// is done.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let result = runtime.block_on(run());

    // A stdin read cannot be cancelled; don't wait for the next line
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    result
}

async fn run() -> Result<()> {
    let config = Config::load()?;

    init_tracing(&config.rust_log);

    info!(
        destination_url = %config.destination_url,
        username = %config.username,
        password = %config.password_masked(),
        input_mode = %config.input_mode,
        forward_workers = config.forward_workers,
        forward_queue_size = config.forward_queue_size,
        "Configuration loaded"
    );

    let server_shutdown = CancellationToken::new();
    let pool_cancellation = CancellationToken::new();

    let client = ForwardClient::new(config.to_client_config())
        .context("Failed to create forward client")?;
    let mut pool =
        ForwardPool::new(config.to_pool_config(), Arc::new(client), pool_cancellation.clone());
    let stats = pool.stats();

    let server_handle = if config.health_enabled {
        let addr = config.health_addr()?;
        let state = AppState::new(stats.clone());
        let shutdown = server_shutdown.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = txrelay_api::start_server(state, addr, shutdown).await {
                error!(error = %e, "Health server failed");
            }
        }))
    } else {
        None
    };

    pool.spawn_workers();
    let mut dispatcher = Dispatcher::new(pool.queue());

    match config.input_mode {
        InputMode::Stream => {
            info!("Reading records from stdin until 'done'");
            tokio::select! {
                reason = dispatcher.run_stream(tokio::io::stdin()) => {
                    info!(reason = %reason, "Input finished");
                },
                () = shutdown_signal() => {
                    warn!("Shutdown signal received, stopping ingestion");
                },
            }
        },
        InputMode::File => {
            let path = &config.input_path;
            info!(path = %path.display(), "Reading record from file");
            if let Err(e) = dispatcher.run_file(path).await {
                error!(error = %e, "Failed to read input file");
            }
        },
    }

    let summary = dispatcher.summary();
    drop(dispatcher);

    if let Err(e) = pool.shutdown_graceful(config.shutdown_timeout()).await {
        error!(error = %e, "Forward pool did not shut down cleanly");
    }

    server_shutdown.cancel();
    if let Some(handle) = server_handle {
        if tokio::time::timeout(Duration::from_secs(5), handle).await.is_err() {
            warn!("Health server did not stop in time");
        }
    }

    let forwards = stats.snapshot();
    info!(
        accepted = summary.accepted,
        malformed = summary.malformed,
        invalid = summary.invalid,
        dropped = summary.dropped,
        delivered = forwards.delivered,
        rejected = forwards.rejected,
        failed = forwards.failed,
        "txrelay finished"
    );

    Ok(())
}

/// Initializes tracing with environment-based configuration.
///
/// `RUST_LOG` wins; otherwise the configured filter is used.
fn init_tracing(configured: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{configured},txrelay=debug")))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C signal");
        },
        () = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
