//! GFS regional forecast map viewer service.
//!
//! Serves a selection page and renders maps of GFS 0.25° forecast fields
//! fetched from NOMADS.

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod page;
pub mod pipeline;
pub mod state;

use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Build the HTTP router.
pub fn router(state: Arc<AppState>, prometheus: PrometheusHandle) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/api/render", get(handlers::render_handler))
        .route("/api/options", get(handlers::options_handler))
        .route("/api/stats", get(handlers::stats_handler))
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(Extension(state))
        .layer(Extension(prometheus))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
