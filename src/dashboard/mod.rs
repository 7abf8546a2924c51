//! Liveness server: a tiny Axum app so hosting platforms can see the
//! process is up, plus a JSON status snapshot.

pub mod routes;

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

pub use routes::{AppState, BotStatus, DashboardState};

/// Start the liveness server in a background task. Bind or serve failures
/// are logged; the bot keeps running without it.
pub fn spawn_dashboard(state: AppState, port: u16) {
    let app = build_router(state);

    tokio::spawn(async move {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(l) => l,
            Err(e) => {
                error!(port, error = %e, "Failed to bind liveness port");
                return;
            }
        };
        info!(port, "Liveness server listening on http://0.0.0.0:{port}");

        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Liveness server stopped");
        }
    });
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(routes::alive))
        .route("/health", get(routes::health))
        .route("/api/status", get(routes::get_status))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
