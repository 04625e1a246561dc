//! HTTP transport module for testgen-relay
//!
//! Axum server exposing `POST /api/generate`. Health, info, and metrics are
//! plain JSON.

use axum::{
    Json, Router,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use std::{cmp::Ordering, collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::catalog::{DEFAULT_MODEL, FRAMEWORK_EXAMPLES, MODEL_ALIASES};
use crate::clients::OllamaClient;
use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::handler::{GenerationRequest, GenerationResult, Generator};

const LATENCY_SAMPLES: usize = 256;

/// Shared state for HTTP server
#[derive(Clone)]
pub struct HttpState {
    pub config: Arc<Config>,
    pub generator: Generator,
    pub metrics: Arc<Mutex<HttpMetrics>>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl HttpState {
    pub fn new(config: Arc<Config>, generator: Generator) -> Self {
        Self {
            config,
            generator,
            metrics: Arc::new(Mutex::new(HttpMetrics::new())),
            started_at: chrono::Utc::now(),
        }
    }
}

/// Metrics for HTTP server
#[derive(Debug, Clone)]
pub struct HttpMetrics {
    pub total_requests: u64,
    pub last_request_unix: i64,
    pub errors_total: u64,
    pub latencies: Vec<f64>, // ring buffer for p95
    pub malformed_outputs: HashMap<&'static str, u64>,
}

impl HttpMetrics {
    fn new() -> Self {
        Self {
            total_requests: 0,
            last_request_unix: chrono::Utc::now().timestamp(),
            errors_total: 0,
            latencies: Vec::with_capacity(LATENCY_SAMPLES),
            malformed_outputs: HashMap::new(),
        }
    }

    fn record(&mut self, latency_ms: f64, success: bool) {
        if latency_ms > 0.0 {
            self.latencies.push(latency_ms);
            if self.latencies.len() > LATENCY_SAMPLES {
                self.latencies.remove(0);
            }
        }
        if !success {
            self.errors_total = self.errors_total.saturating_add(1);
        }
        self.total_requests = self.total_requests.saturating_add(1);
        self.last_request_unix = chrono::Utc::now().timestamp();
    }

    /// Average and p95 latency in milliseconds
    fn latency_stats(&self) -> (Option<f64>, Option<f64>) {
        if self.latencies.is_empty() {
            return (None, None);
        }
        let sum: f64 = self.latencies.iter().sum();
        let avg = sum / self.latencies.len() as f64;
        let mut sorted = self.latencies.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let p95_idx = ((sorted.len() as f64 * 0.95) as usize).min(sorted.len() - 1);
        (Some(avg), sorted.get(p95_idx).copied())
    }
}

/// Generation endpoint
pub async fn generate_handler(
    State(state): State<HttpState>,
    payload: std::result::Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerationResult>> {
    let Json(request) = payload.map_err(|rejection| RelayError::Validation {
        message: rejection.body_text(),
    })?;

    let result = state.generator.generate(&request).await?;
    if let Some(kind) = result.malformed {
        let mut m = state.metrics.lock().await;
        *m.malformed_outputs.entry(kind).or_insert(0) += 1;
    }
    Ok(Json(result))
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    "ok"
}

/// Info endpoint
pub async fn info_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let models: Vec<_> = MODEL_ALIASES
        .iter()
        .map(|(alias, model)| json!({ "alias": alias, "model": model }))
        .collect();
    let frameworks: Vec<_> = FRAMEWORK_EXAMPLES
        .iter()
        .map(|ex| json!({ "slug": ex.slug, "description": ex.description }))
        .collect();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        json!({
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "started_at": state.started_at.to_rfc3339(),
            "generation": {
                "url": state.generator.backend().endpoint(),
                "timeout_secs": state.config.generation.timeout_secs,
                "default_model": DEFAULT_MODEL,
                "models": models
            },
            "frameworks": frameworks,
            "server": {
                "bind": state.config.server.bind.to_string()
            }
        })
        .to_string(),
    )
}

/// Metrics endpoint
pub async fn metrics_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let metrics = state.metrics.lock().await.clone();
    let (avg_latency_ms, p95_latency_ms) = metrics.latency_stats();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        json!({
            "metrics_version": "1",
            "total_requests": metrics.total_requests,
            "last_request_unix": metrics.last_request_unix,
            "errors_total": metrics.errors_total,
            "malformed_outputs": metrics.malformed_outputs,
            "avg_latency_ms": avg_latency_ms,
            "p95_latency_ms": p95_latency_ms
        })
        .to_string(),
    )
}

/// Build the router over an existing state
pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/api/generate", post(generate_handler))
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .route("/metrics", get(metrics_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            |State(metrics): State<Arc<Mutex<HttpMetrics>>>,
             req: axum::http::Request<Body>,
             next: axum::middleware::Next| async move {
                let is_api = req.uri().path().starts_with("/api/");
                let start = is_api.then(std::time::Instant::now);
                let resp = next.run(req).await;
                if let Some(start_time) = start {
                    let latency_ms = start_time.elapsed().as_millis() as f64;
                    metrics
                        .lock()
                        .await
                        .record(latency_ms, resp.status().is_success());
                }
                resp
            },
        ))
        .with_state(state)
}

/// Build state from configuration using the Ollama-compatible backend
pub fn build_state(config: Config) -> Result<HttpState> {
    let backend = OllamaClient::new(&config.generation)?;
    Ok(HttpState::new(
        Arc::new(config),
        Generator::new(Arc::new(backend)),
    ))
}

/// Start the HTTP server
pub async fn start_http_server(config: Config) -> Result<()> {
    let bind = config.server.bind;
    let generate_url = config.generation.url.clone();
    let app = router(build_state(config)?);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP listener: {}", e))?;

    tracing::info!(
        "Starting HTTP server on {} (generation backend at {})",
        bind,
        generate_url
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}
