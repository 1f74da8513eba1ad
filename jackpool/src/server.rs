// Copyright (c) 2024 Botho Foundation

//! HTTP/JSON service for running simulations remotely.
//!
//! Routes:
//! - `GET /health`
//! - `GET /progress`: latest snapshot of the active or last run
//! - `POST /simulate`: run a simulation with the posted parameters
//! - `POST /cancel`: stop the active run at the next round boundary
//! - `GET /export/{summary,details,jackpots}.csv`: CSV of the last result
//!
//! Only one simulation runs at a time. It executes on a blocking worker so
//! progress polling stays responsive while it runs.

use anyhow::Result;
use http_body_util::{BodyExt, Full, Limited};
use hyper::{
    body::{Bytes, Incoming},
    header::{
        HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
        ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, VARY,
    },
    server::conn::http1,
    service::service_fn,
    Method, Request, Response, StatusCode,
};
use hyper_util::rt::TokioIo;
use jpl_engine::{
    CancelToken, ProgressHandle, Simulation, SimulationConfig, SimulationError, SimulationResult,
};
use jpl_report::{
    build_charts, details_csv, jackpots_csv, summary_csv, ChartSpec, RunStatistics,
    TierComparison,
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 1 << 20;

/// Shared state of the service.
pub struct ServerState {
    /// Parameters used for any field a request leaves out.
    pub defaults: SimulationConfig,
    pub cors_origins: Vec<String>,
    progress: ProgressHandle,
    cancel: CancelToken,
    running: AtomicBool,
    last_result: RwLock<Option<Arc<SimulationResult>>>,
}

impl ServerState {
    pub fn new(defaults: SimulationConfig, cors_origins: Vec<String>) -> Self {
        Self {
            defaults,
            cors_origins,
            progress: ProgressHandle::new(),
            cancel: CancelToken::new(),
            running: AtomicBool::new(false),
            last_result: RwLock::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn last_result(&self) -> Option<Arc<SimulationResult>> {
        self.last_result.read().clone()
    }
}

/// Body of a successful `POST /simulate`.
#[derive(Serialize)]
struct SimulateResponse<'a> {
    status: &'static str,
    result: &'a SimulationResult,
    statistics: RunStatistics,
    comparison: TierComparison,
    charts: Vec<ChartSpec>,
}

/// Clears the busy flag when the run ends, however it ends.
struct RunGuard(Arc<ServerState>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::SeqCst);
    }
}

/// Accept connections until the listener fails.
pub async fn serve(addr: SocketAddr, state: Arc<ServerState>) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP service listening on {}", addr);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(|req| handle_request(req, state.clone()));

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                error!("Error serving connection: {:?}", err);
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<ServerState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    // Extract Origin header for CORS checking
    let origin = req
        .headers()
        .get("Origin")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let body = match Limited::new(req.into_body(), MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            warn!("Failed to read request body: {}", err);
            let allowed = check_cors_origin(origin.as_deref(), &state.cors_origins);
            return Ok(cors_response(
                error_response(StatusCode::BAD_REQUEST, "failed to read request body"),
                allowed.as_deref(),
            ));
        }
    };

    Ok(route(&state, &method, &path, body, origin.as_deref()).await)
}

/// Dispatch one request. Exposed so the routes can be driven without a socket.
pub async fn route(
    state: &Arc<ServerState>,
    method: &Method,
    path: &str,
    body: Bytes,
    origin: Option<&str>,
) -> Response<Full<Bytes>> {
    let allowed_origin = check_cors_origin(origin, &state.cors_origins);

    let response = match (method, path) {
        (&Method::OPTIONS, _) => Response::new(Full::new(Bytes::new())),
        (&Method::GET, "/health") => json_response(StatusCode::OK, &json!({ "status": "ok" })),
        (&Method::GET, "/progress") => progress(state),
        (&Method::POST, "/simulate") => simulate(state, &body).await,
        (&Method::POST, "/cancel") => cancel(state),
        (&Method::GET, p) if p.starts_with("/export/") => export(state, &p["/export/".len()..]),
        _ => error_response(StatusCode::NOT_FOUND, "not found"),
    };

    cors_response(response, allowed_origin.as_deref())
}

fn progress(state: &ServerState) -> Response<Full<Bytes>> {
    let running = state.is_running();
    match state.progress.latest() {
        Some(snapshot) => json_response(
            StatusCode::OK,
            &json!({ "status": "ok", "running": running, "progress": snapshot }),
        ),
        None => json_response(
            StatusCode::OK,
            &json!({ "status": "no_data", "running": running }),
        ),
    }
}

fn cancel(state: &ServerState) -> Response<Full<Bytes>> {
    if !state.is_running() {
        return json_response(StatusCode::OK, &json!({ "status": "not_running" }));
    }
    state.cancel.cancel();
    info!("Cancellation requested");
    json_response(StatusCode::OK, &json!({ "status": "cancelling" }))
}

/// Overlay the fields of a JSON object onto the default parameters.
fn parse_config(defaults: &SimulationConfig, body: &[u8]) -> Result<SimulationConfig, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(defaults.clone());
    }

    let overrides: Value =
        serde_json::from_slice(body).map_err(|e| format!("invalid JSON body: {e}"))?;
    let Value::Object(overrides) = overrides else {
        return Err("request body must be a JSON object".to_string());
    };

    let mut merged = serde_json::to_value(defaults).map_err(|e| e.to_string())?;
    if let Value::Object(fields) = &mut merged {
        merge_object(fields, overrides);
    }
    serde_json::from_value(merged).map_err(|e| format!("invalid parameters: {e}"))
}

/// Nested objects merge key by key; any other value replaces the default.
fn merge_object(base: &mut Map<String, Value>, overrides: Map<String, Value>) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                merge_object(existing, nested)
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

async fn simulate(state: &Arc<ServerState>, body: &[u8]) -> Response<Full<Bytes>> {
    let config = match parse_config(&state.defaults, body) {
        Ok(config) => config,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, &message),
    };
    if let Err(err) = config.validate() {
        return error_response(StatusCode::BAD_REQUEST, &err.to_string());
    }

    if state
        .running
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return error_response(StatusCode::CONFLICT, "a simulation is already running");
    }
    let guard = RunGuard(state.clone());
    state.progress.reset();
    state.cancel.reset();

    let progress = state.progress.clone();
    let cancel = state.cancel.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let _guard = guard;
        Simulation::new(config)?
            .with_progress(progress)
            .with_cancel(cancel)
            .run()
    })
    .await;

    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            state.progress.reset();
            return simulation_error(&err);
        }
        Err(err) => {
            state.progress.reset();
            error!("Simulation worker failed: {}", err);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "simulation worker failed");
        }
    };

    let statistics = RunStatistics::from_result(&result);
    let comparison = TierComparison::new(&statistics, &result.config);
    let charts = build_charts(&result, Some(&comparison));
    let response = json_response(
        StatusCode::OK,
        &SimulateResponse {
            status: "success",
            result: &result,
            statistics,
            comparison,
            charts,
        },
    );

    *state.last_result.write() = Some(Arc::new(result));
    response
}

fn simulation_error(err: &SimulationError) -> Response<Full<Bytes>> {
    match err {
        SimulationError::Cancelled { completed_rounds } => json_response(
            StatusCode::CONFLICT,
            &json!({
                "status": "cancelled",
                "message": err.to_string(),
                "completed_rounds": completed_rounds,
            }),
        ),
        err if err.is_configuration() => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
        err => {
            error!("Simulation failed: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    }
}

fn export(state: &ServerState, name: &str) -> Response<Full<Bytes>> {
    let Some(result) = state.last_result() else {
        return error_response(StatusCode::NOT_FOUND, "no simulation result available");
    };

    let csv = match name {
        "summary.csv" => summary_csv(&result.rounds),
        "details.csv" => details_csv(&result.details),
        "jackpots.csv" => jackpots_csv(&result.jackpots),
        _ => return error_response(StatusCode::NOT_FOUND, "unknown export"),
    };
    body_response(StatusCode::OK, "text/csv; charset=utf-8", Bytes::from(csv))
}

/// Echo an allowed origin back, or `None` to omit CORS headers.
///
/// `"*"` allows every origin. `http://localhost` and `http://127.0.0.1`
/// also match the same host on any port.
fn check_cors_origin(request_origin: Option<&str>, allowed_origins: &[String]) -> Option<String> {
    let origin = request_origin?;

    // Wildcard allows every origin
    if allowed_origins.iter().any(|o| o == "*") {
        return Some(origin.to_string());
    }

    for allowed in allowed_origins {
        if origin == allowed {
            return Some(origin.to_string());
        }
        // "http://localhost" also matches "http://localhost:3000", never "http://localhost.evil"
        if origin.starts_with(allowed.as_str())
            && (allowed.ends_with("localhost") || allowed.ends_with("127.0.0.1"))
        {
            let suffix = &origin[allowed.len()..];
            if suffix.is_empty() || suffix.starts_with(':') {
                return Some(origin.to_string());
            }
        }
    }

    None
}

fn cors_response(
    mut response: Response<Full<Bytes>>,
    allowed_origin: Option<&str>,
) -> Response<Full<Bytes>> {
    // Without an allowed origin no CORS headers are set and the browser blocks the response
    let Some(origin) = allowed_origin.and_then(|o| HeaderValue::from_str(o).ok()) else {
        return response;
    };

    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(VARY, HeaderValue::from_static("Origin"));
    response
}

fn body_response(
    status: StatusCode,
    content_type: &'static str,
    body: Bytes,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(value) {
        Ok(body) => body_response(status, "application/json", Bytes::from(body)),
        Err(err) => {
            error!("Failed to encode response: {}", err);
            body_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "application/json",
                Bytes::from_static(br#"{"status":"error","message":"failed to encode response"}"#),
            )
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &json!({ "status": "error", "message": message }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jpl_engine::Preset;

    fn origins() -> Vec<String> {
        vec![
            "http://localhost".to_string(),
            "https://lottery.example".to_string(),
        ]
    }

    #[test]
    fn test_cors_localhost_any_port() {
        let allowed = origins();
        assert_eq!(
            check_cors_origin(Some("http://localhost:3000"), &allowed).as_deref(),
            Some("http://localhost:3000")
        );
        assert!(check_cors_origin(Some("http://localhost.evil.com"), &allowed).is_none());
        assert!(check_cors_origin(Some("https://lottery.example:8443"), &allowed).is_none());
        assert!(check_cors_origin(None, &allowed).is_none());
    }

    #[test]
    fn test_cors_wildcard() {
        let allowed = vec!["*".to_string()];
        assert_eq!(
            check_cors_origin(Some("https://anywhere.test"), &allowed).as_deref(),
            Some("https://anywhere.test")
        );
    }

    #[test]
    fn test_parse_config_merges_defaults() {
        let defaults = SimulationConfig::default();

        assert_eq!(parse_config(&defaults, b"  ").unwrap(), defaults);

        let config = parse_config(&defaults, br#"{"num_rounds": 12, "seed": 5}"#).unwrap();
        assert_eq!(config.num_rounds, 12);
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.players_range, defaults.players_range);

        assert!(parse_config(&defaults, b"[1, 2]").is_err());
        assert!(parse_config(&defaults, b"{\"prize_table\": {\"match2\": \"x\"}}").is_err());
        assert!(parse_config(&defaults, b"{\"num_rounds\": \"many\"}").is_err());
    }

    #[test]
    fn test_partial_prize_table_keeps_defaults() {
        let defaults = Preset::LegacyFixed.config();

        let config = parse_config(&defaults, br#"{"prize_table": {"match2": 10}}"#).unwrap();
        assert_eq!(config.prize_table.match2, 10.0);
        assert_eq!(config.prize_table.match3, 50.0);
        assert_eq!(config.prize_table.match4, 200.0);
        assert_eq!(config.prize_table.match5, 3_000.0);
        assert_eq!(config.return_pool, 0.0);
    }

    #[test]
    fn test_error_status_mapping() {
        let cancelled = SimulationError::Cancelled { completed_rounds: 3 };
        assert_eq!(simulation_error(&cancelled).status(), StatusCode::CONFLICT);

        let invariant = SimulationError::ArithmeticInvariantViolation {
            round: 1,
            detail: "negative jackpot".to_string(),
        };
        assert_eq!(
            simulation_error(&invariant).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let invalid = SimulationError::InvalidNumbers("7 values".to_string());
        assert_eq!(simulation_error(&invalid).status(), StatusCode::BAD_REQUEST);
    }
}
