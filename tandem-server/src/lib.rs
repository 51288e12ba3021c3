mod config;
mod room;
mod signaling;

pub use config::*;
pub use room::*;
pub use signaling::*;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builds the relay's HTTP surface: the WebSocket endpoint and the
/// diagnostics listing.
pub fn router(service: RelayService) -> Router {
    let ws_path = service.config().ws_path.clone();
    let rooms_path = service.config().rooms_path.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(&ws_path, get(ws_handler))
        .route(&rooms_path, get(rooms_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Serves the relay on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, service: RelayService, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
        .context("relay server terminated")
}
