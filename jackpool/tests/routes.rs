//! HTTP routes driven directly through the router.

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Response, StatusCode};
use jackpool::server::{route, ServerState};
use jpl_engine::{IntRange, SimulationConfig};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

fn state() -> Arc<ServerState> {
    let defaults = SimulationConfig {
        num_rounds: 3,
        players_range: IntRange::new(20, 30),
        cards_per_player_range: IntRange::new(1, 2),
        detail_capacity: 10,
        ..SimulationConfig::default()
    };
    Arc::new(ServerState::new(defaults, vec!["http://localhost".to_string()]))
}

async fn call(
    state: &Arc<ServerState>,
    method: Method,
    path: &str,
    body: &'static str,
) -> Response<Full<Bytes>> {
    route(state, &method, path, Bytes::from(body), None).await
}

async fn json(response: Response<Full<Bytes>>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let state = state();
    let response = call(&state, Method::GET, "/health", "").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route() {
    let state = state();
    let response = call(&state, Method::GET, "/nowhere", "").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_simulate_then_progress_and_export() {
    let state = state();

    let progress = json(call(&state, Method::GET, "/progress", "").await).await;
    assert_eq!(progress["status"], "no_data");
    let missing = call(&state, Method::GET, "/export/summary.csv", "").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let request = r#"{"seed": 21, "num_rounds": 4}"#;
    let response = call(&state, Method::POST, "/simulate", request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["result"]["seed"], 21);
    assert_eq!(body["result"]["rounds"].as_array().unwrap().len(), 4);
    assert_eq!(body["statistics"]["summary"]["total_rounds"], 4);
    assert_eq!(body["comparison"]["rows"].as_array().unwrap().len(), 5);
    assert_eq!(body["charts"].as_array().unwrap().len(), 7);
    assert!(!state.is_running());

    let progress = json(call(&state, Method::GET, "/progress", "").await).await;
    assert_eq!(progress["status"], "ok");
    assert_eq!(progress["running"], false);
    assert_eq!(progress["progress"]["completed_rounds"], 4);
    assert_eq!(progress["progress"]["completion_percentage"], 100.0);

    let csv = call(&state, Method::GET, "/export/summary.csv", "").await;
    assert_eq!(csv.status(), StatusCode::OK);
    assert!(csv.headers()["content-type"].to_str().unwrap().starts_with("text/csv"));
    let text = csv.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(std::str::from_utf8(&text).unwrap().lines().count(), 5);

    let details = call(&state, Method::GET, "/export/details.csv", "").await;
    assert_eq!(details.status(), StatusCode::OK);
    let other = call(&state, Method::GET, "/export/other.csv", "").await;
    assert_eq!(other.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_parameters() {
    let state = state();

    let response = call(&state, Method::POST, "/simulate", r#"{"pool_insert": 2.0}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await["status"], "error");

    let response = call(&state, Method::POST, "/simulate", "{not json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = call(&state, Method::POST, "/simulate", r#"{"num_rounds": 0}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(!state.is_running());
    let progress = json(call(&state, Method::GET, "/progress", "").await).await;
    assert_eq!(progress["status"], "no_data");
}

#[tokio::test]
async fn test_cors_headers() {
    let state = state();

    let preflight = route(
        &state,
        &Method::OPTIONS,
        "/simulate",
        Bytes::new(),
        Some("http://localhost:5173"),
    )
    .await;
    assert_eq!(preflight.status(), StatusCode::OK);
    let headers = preflight.headers();
    assert_eq!(headers["access-control-allow-origin"], "http://localhost:5173");
    assert!(headers["access-control-allow-methods"]
        .to_str()
        .unwrap()
        .contains("POST"));

    let foreign = route(
        &state,
        &Method::GET,
        "/health",
        Bytes::new(),
        Some("https://elsewhere.test"),
    )
    .await;
    assert!(foreign.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_busy_and_cancel() {
    let state = state();

    let response = json(call(&state, Method::POST, "/cancel", "").await).await;
    assert_eq!(response["status"], "not_running");

    let long_run = {
        let state = state.clone();
        tokio::spawn(async move {
            let request = r#"{"num_rounds": 1000000, "seed": 1}"#;
            call(&state, Method::POST, "/simulate", request).await
        })
    };

    // Wait until the run has published its first round.
    loop {
        let progress = json(call(&state, Method::GET, "/progress", "").await).await;
        if progress["status"] == "ok" && progress["running"] == true {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let busy = call(&state, Method::POST, "/simulate", "").await;
    assert_eq!(busy.status(), StatusCode::CONFLICT);

    let response = json(call(&state, Method::POST, "/cancel", "").await).await;
    assert_eq!(response["status"], "cancelling");

    let cancelled = long_run.await.unwrap();
    assert_eq!(cancelled.status(), StatusCode::CONFLICT);
    assert_eq!(json(cancelled).await["status"], "cancelled");

    assert!(!state.is_running());
    let progress = json(call(&state, Method::GET, "/progress", "").await).await;
    assert_eq!(progress["status"], "no_data");
    let export = call(&state, Method::GET, "/export/summary.csv", "").await;
    assert_eq!(export.status(), StatusCode::NOT_FOUND);
}
