//! HTTP server setup and request routing.
//!
//! Requests flow through middleware in order:
//! 1. Request ID generation
//! 2. Request/response tracing
//! 3. Timeout enforcement (30s)
//! 4. Handler execution
//!
//! The server stops accepting connections when its cancellation token is
//! cancelled and finishes in-flight requests before returning.

use std::{net::SocketAddr, time::Duration};

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

use crate::{handlers, AppState};

/// Creates the router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use txrelay_api::{create_router, AppState};
/// use txrelay_delivery::ForwardStats;
///
/// let app = create_router(AppState::new(Arc::new(ForwardStats::default())));
/// ```
pub fn create_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/live", get(handlers::liveness_check));

    Router::new()
        .route("/", any(handlers::receive))
        .merge(health_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}

/// Middleware to inject request ID into all responses.
async fn inject_request_id(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    let mut req = req;
    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert("X-Request-Id", header_value);
    }

    response
}

/// Binds `addr` and serves until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns `std::io::Error` if the address cannot be bound.
pub async fn start_server(
    state: AppState,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> Result<(), std::io::Error> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    serve(listener, state, shutdown).await
}

/// Serves on an already bound listener until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns `std::io::Error` if the listener fails.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), std::io::Error> {
    let app = create_router(state);
    let actual_addr = listener.local_addr()?;

    info!("HTTP server listening on {}", actual_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    info!("HTTP server stopped gracefully");
    Ok(())
}
