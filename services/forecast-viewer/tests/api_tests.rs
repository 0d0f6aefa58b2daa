//! HTTP-level tests against the router with an in-memory gateway.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use tower::ServiceExt;

use forecast_viewer::handlers::{STATUS_HEADER, TITLE_HEADER};
use forecast_viewer::pipeline::DATASET_LOADED;
use forecast_viewer::router;

use common::{app_state, memory_opener};

fn app() -> (Router, std::sync::Arc<dataset_gateway::MemoryOpener>) {
    let opener = memory_opener();
    let handle = PrometheusBuilder::new().build_recorder().handle();
    (router(app_state(&opener), handle), opener)
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_render_png() {
    let (app, _) = app();
    let response = get(
        app,
        "/api/render?date=2024-03-05&hour=06&step=12&parameter=pratesfc&region=sabu-raijua",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(response.headers()[STATUS_HEADER], DATASET_LOADED);
    assert!(response.headers().contains_key(TITLE_HEADER));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn test_unknown_parameter_is_a_warning_without_fetch() {
    let (app, opener) = app();
    let response = get(
        app,
        "/api/render?date=2024-03-05&hour=06&step=0&parameter=Kelembapan%20(rh2m)",
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["status"], "warning");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Parameter tidak dikenali"));
    assert_eq!(opener.open_count(), 0);
}

#[tokio::test]
async fn test_missing_run_is_an_error() {
    let (app, _) = app();
    let response = get(
        app,
        "/api/render?date=2023-01-01&hour=00&step=0&parameter=tmp2m&region=ntt",
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_options() {
    let (app, _) = app();
    let response = get(app, "/api/options").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["hours"], serde_json::json!(["00", "06", "12", "18"]));
    assert_eq!(body["steps"]["max"], 240);
    assert_eq!(body["parameters"].as_array().unwrap().len(), 4);
    assert_eq!(body["regions"][1]["id"], "ntt");
    assert_eq!(
        body["regions"][1]["bbox"],
        serde_json::json!([118.5, 125.5, -11.5, -7.5])
    );
    assert_eq!(body["default_region"], "sabu-raijua");
}

#[tokio::test]
async fn test_index_page() {
    let (app, _) = app();
    let response = get(app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Tampilkan Visualisasi"));
    assert!(html.contains("Angin Permukaan (ugrd10m & vgrd10m)"));
}

#[tokio::test]
async fn test_health_and_metrics() {
    let (app, _) = app();
    let response = get(app.clone(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(app, "/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_stats_track_cache() {
    let (app, _) = app();
    for _ in 0..2 {
        let response = get(
            app.clone(),
            "/api/render?date=2024-03-05&hour=06&step=0&parameter=tmp2m&region=sabu-raijua",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let body = json_body(get(app, "/api/stats").await).await;
    assert_eq!(body["requests"]["requests"], 2);
    assert_eq!(body["requests"]["renders"], 2);
    assert_eq!(body["dataset_cache"]["entries"], 1);
    assert_eq!(body["dataset_cache"]["hits"], 1);
    assert_eq!(body["dataset_cache"]["misses"], 1);
    assert_eq!(body["font_loaded"], false);
}
