use axum::{http::StatusCode, routing::post, Json, Router};
use promptlab_core::providers::proxy::ProxyClient;
use promptlab_core::providers::{GenerateRequest, InferenceClient};
use promptlab_proxy::config::ProxyConfig;
use promptlab_proxy::server::{serve, AppState};
use serde_json::{json, Value};
use tokio::net::TcpListener;

async fn spawn(app: Router) -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{}", addr))
}

async fn spawn_proxy(upstream_url: &str) -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let cfg = ProxyConfig {
        upstream_url: upstream_url.to_string(),
        ..Default::default()
    };
    tokio::spawn(async move {
        let _ = serve(listener, AppState::new(&cfg)).await;
    });
    Ok(format!("http://{}", addr))
}

/// Answers like `/api/generate` and echoes the received options back in the text.
fn fake_ollama() -> Router {
    Router::new().route(
        "/api/generate",
        post(|Json(body): Json<Value>| async move {
            Json(json!({
                "model": "",
                "response": format!(
                    "t={} n={} stream={}",
                    body["options"]["temperature"], body["options"]["num_predict"], body["stream"]
                ),
                "done": true,
                "total_duration": 1_234_567_890u64,
                "eval_count": 17
            }))
        }),
    )
}

fn broken_ollama() -> Router {
    Router::new().route(
        "/api/generate",
        post(|| async { (StatusCode::NOT_FOUND, "model 'ghost' not found") }),
    )
}

#[tokio::test]
async fn test_run_translates_units_and_defaults() -> anyhow::Result<()> {
    let upstream = spawn(fake_ollama()).await?;
    let proxy = spawn_proxy(&upstream).await?;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/run", proxy))
        .json(&json!({"model": "llama3.2:3b", "prompt": "hi"}))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await?;

    assert_eq!(body["response"], "t=0.7 n=256 stream=false");
    assert_eq!(body["model"], "llama3.2:3b");
    assert_eq!(body["totalDurationMs"], 1235);
    assert_eq!(body["evalCount"], 17);
    Ok(())
}

#[tokio::test]
async fn test_upstream_failure_is_ollama_error() -> anyhow::Result<()> {
    let upstream = spawn(broken_ollama()).await?;
    let proxy = spawn_proxy(&upstream).await?;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/run", proxy))
        .json(&json!({"model": "ghost", "prompt": "hi"}))
        .send()
        .await?;
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await?;
    assert_eq!(body["error"], "ollama_error");
    assert_eq!(body["details"], "model 'ghost' not found");
    Ok(())
}

#[tokio::test]
async fn test_unreachable_upstream_is_server_error() -> anyhow::Result<()> {
    let dead = {
        let l = std::net::TcpListener::bind("127.0.0.1:0")?;
        format!("http://{}", l.local_addr()?)
    };
    let proxy = spawn_proxy(&dead).await?;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/run", proxy))
        .json(&json!({"model": "m", "prompt": "hi"}))
        .send()
        .await?;
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await?;
    assert_eq!(body["error"], "server_error");
    assert!(!body["details"].as_str().unwrap_or_default().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_proxy_client_end_to_end() -> anyhow::Result<()> {
    let upstream = spawn(fake_ollama()).await?;
    let proxy = spawn_proxy(&upstream).await?;

    let client = ProxyClient::new(&proxy);
    let out = client
        .generate(
            &GenerateRequest::new("mistral:7b", "q")
                .with_temperature(Some(0.2))
                .with_num_predict(Some(64)),
        )
        .await?;
    assert_eq!(out.response, "t=0.2 n=64 stream=false");
    assert_eq!(out.total_duration_ms(), Some(1235.0));
    assert_eq!(out.eval_count, Some(17));

    let failing = ProxyClient::new(&spawn_proxy(&spawn(broken_ollama()).await?).await?);
    let err = failing
        .generate(&GenerateRequest::new("ghost", "q"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "model 'ghost' not found");
    Ok(())
}

#[tokio::test]
async fn test_health() -> anyhow::Result<()> {
    let proxy = spawn_proxy("http://127.0.0.1:9").await?;
    let text = reqwest::get(format!("{}/health", proxy)).await?.text().await?;
    assert_eq!(text, "ok");
    Ok(())
}
