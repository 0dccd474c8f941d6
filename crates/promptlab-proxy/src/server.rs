use crate::config::{ProxyConfig, DEFAULT_NUM_PREDICT, DEFAULT_TEMPERATURE};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use promptlab_core::errors::UpstreamError;
use promptlab_core::providers::ollama::OllamaClient;
use promptlab_core::providers::proxy::{ErrorPayload, RunRequest, RunResponse};
use promptlab_core::providers::{GenerateRequest, InferenceClient};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<dyn InferenceClient>,
}

impl AppState {
    pub fn new(cfg: &ProxyConfig) -> Self {
        Self {
            upstream: Arc::new(OllamaClient::with_client(
                &cfg.upstream_url,
                reqwest::Client::new(),
            )),
        }
    }
}

/// Always answered with HTTP 500, as the browser client expects.
#[derive(Debug)]
pub struct ProxyError(ErrorPayload);

impl ProxyError {
    fn from_anyhow(e: &anyhow::Error) -> Self {
        let payload = match e.downcast_ref::<UpstreamError>() {
            Some(up) => ErrorPayload {
                error: "ollama_error".into(),
                details: up.body.clone(),
            },
            None => ErrorPayload {
                error: "server_error".into(),
                details: e.to_string(),
            },
        };
        Self(payload)
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self.0)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/run", post(run_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn run_handler(
    State(state): State<AppState>,
    Json(req): Json<RunRequest>,
) -> Result<Json<RunResponse>, ProxyError> {
    let gen = upstream_request(&req);
    match state.upstream.generate(&gen).await {
        Ok(data) => {
            tracing::info!(
                event = "proxy.run",
                model = %req.model,
                eval_count = ?data.eval_count,
                total_duration_ns = ?data.total_duration
            );
            let model = if data.model.is_empty() {
                req.model
            } else {
                data.model
            };
            Ok(Json(RunResponse {
                response: data.response,
                model,
                total_duration_ms: data
                    .total_duration
                    .filter(|ns| *ns > 0)
                    .map(|ns| (ns as f64 / 1_000_000.0).round() as u64),
                eval_count: data.eval_count,
            }))
        }
        Err(e) => {
            tracing::warn!(event = "proxy.run.failed", model = %req.model, error = %e);
            Err(ProxyError::from_anyhow(&e))
        }
    }
}

/// Maps the proxy body onto a generate call, filling the sampling defaults.
pub fn upstream_request(req: &RunRequest) -> GenerateRequest {
    let mut gen = GenerateRequest::new(req.model.as_str(), req.prompt.as_str())
        .with_temperature(Some(req.temperature.unwrap_or(DEFAULT_TEMPERATURE)))
        .with_num_predict(Some(req.max_tokens.unwrap_or(DEFAULT_NUM_PREDICT)));
    gen.system = req.system.clone();
    gen
}

pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub async fn run(cfg: ProxyConfig) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&cfg.addr).await?;
    tracing::info!(
        event = "server_start",
        addr = %cfg.addr,
        upstream = %cfg.upstream_url
    );
    serve(listener, AppState::new(&cfg)).await
}
