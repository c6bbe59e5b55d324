//! REST API for the published sensor states.
//!
//! Provides three GET endpoints:
//! - `/sensors`: latest publication of every sensor
//! - `/sensors/{unique_id}`: latest publication of one sensor
//! - `/publications`: full publication log with optional step filtering

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::io::PublicationRow;
use crate::sensor::PublishedState;

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the replay completes and wrapped in `Arc`; no
/// locks are needed since all data is read-only.
pub struct AppState {
    /// Latest publication per sensor, ordered by unique id.
    pub sensors: Vec<PublishedState>,
    /// Every publication made during the run, in order.
    pub publications: Vec<PublicationRow>,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sensors", get(handlers::list_sensors))
        .route("/sensors/{unique_id}", get(handlers::get_sensor))
        .route("/publications", get(handlers::get_publications))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
