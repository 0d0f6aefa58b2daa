//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tracing::{info, instrument, warn};

use forecast_common::time::MAX_FORECAST_HOUR;
use forecast_common::{ForecastError, ModelCycle, Parameter, Region, Severity};

use crate::page::index_html;
use crate::pipeline::{render_map, RenderQuery, RenderRequest};
use crate::state::AppState;

/// Header carrying the status line for a successful render.
pub const STATUS_HEADER: &str = "x-status-message";
/// Header carrying the main plot title.
pub const TITLE_HEADER: &str = "x-plot-title";

// ============================================================================
// Response Types
// ============================================================================

/// Body of a failed render.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ParameterOption {
    pub id: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RegionOption {
    pub id: &'static str,
    pub name: &'static str,
    /// `[min_lon, max_lon, min_lat, max_lat]`
    pub bbox: [f64; 4],
}

#[derive(Debug, Serialize)]
pub struct StepRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub hours: Vec<String>,
    pub steps: StepRange,
    pub parameters: Vec<ParameterOption>,
    pub regions: Vec<RegionOption>,
    pub default_region: String,
    pub default_date: String,
}

/// Map a pipeline error to its JSON response.
pub fn error_response(err: &ForecastError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorResponse {
        status: err.severity().as_str(),
        message: err.to_string(),
    };
    (status, Json(body)).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Selection page
pub async fn index_handler(Extension(state): Extension<Arc<AppState>>) -> Html<String> {
    let today = Utc::now().date_naive();
    Html(index_html(
        state.config.default_run_date(today),
        &state.config.default_region,
    ))
}

/// GET /api/render - Render one map as PNG
#[instrument(skip(state))]
pub async fn render_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<RenderQuery>,
) -> Response {
    let parameter = query.parameter.clone().unwrap_or_default();
    state.metrics.record_request(&parameter);

    let today = Utc::now().date_naive();
    let result = match RenderRequest::from_query(&query, &state.config, today) {
        Ok(request) => render_map(&state, &request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(map) => {
            info!(title = %map.title, valid = %map.valid_time, "Render request served");
            let mut response = (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "image/png")],
                map.png,
            )
                .into_response();
            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(&map.status) {
                headers.insert(STATUS_HEADER, value);
            }
            if let Ok(value) = HeaderValue::from_bytes(map.title.as_bytes()) {
                headers.insert(TITLE_HEADER, value);
            }
            response
        }
        Err(e) => {
            let severity = e.severity();
            match severity {
                Severity::Warning => warn!(error = %e, "Render request rejected"),
                Severity::Error => tracing::error!(error = %e, "Render request failed"),
            }
            state.metrics.record_failure(severity);
            error_response(&e)
        }
    }
}

/// GET /api/options - Choices offered by the form
pub async fn options_handler(Extension(state): Extension<Arc<AppState>>) -> Json<OptionsResponse> {
    let today = Utc::now().date_naive();
    Json(OptionsResponse {
        hours: ModelCycle::all_4x_daily().iter().map(|c| c.label()).collect(),
        steps: StepRange {
            min: 0,
            max: MAX_FORECAST_HOUR,
        },
        parameters: Parameter::all()
            .iter()
            .map(|p| ParameterOption {
                id: p.identifier(),
                name: p.display_name(),
            })
            .collect(),
        regions: Region::all()
            .iter()
            .map(|r| RegionOption {
                id: r.id,
                name: r.name,
                bbox: r.bbox.extent(),
            })
            .collect(),
        default_region: state.config.default_region.clone(),
        default_date: state
            .config
            .default_run_date(today)
            .format("%Y-%m-%d")
            .to_string(),
    })
}

/// GET /api/stats - Request counters and dataset cache statistics
pub async fn stats_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let cache = state.gateway.lock().await.cache_stats();
    Json(serde_json::json!({
        "requests": state.metrics.snapshot(),
        "font_loaded": state.renderer.has_font(),
        "dataset_cache": {
            "entries": cache.entries,
            "hits": cache.hits,
            "misses": cache.misses,
        },
    }))
}

/// GET /health - Liveness check
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus metrics endpoint
pub async fn metrics_handler(Extension(handle): Extension<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
}
