//! Health-check shim for the hosting platform's keep-alive probes.

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

async fn index() -> &'static str {
    "Bot is running."
}

async fn healthz() -> &'static str {
    "ok"
}

/// Router serving `/` and `/healthz`.
pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
}
