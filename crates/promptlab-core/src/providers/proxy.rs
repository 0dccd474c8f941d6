use super::{GenerateRequest, GenerateResponse, InferenceClient};
use crate::errors::UpstreamError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Body accepted by the proxy's `POST /api/run`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub response: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorPayload {
    pub error: String,
    #[serde(default)]
    pub details: String,
}

impl From<&GenerateRequest> for RunRequest {
    fn from(req: &GenerateRequest) -> Self {
        Self {
            model: req.model.clone(),
            prompt: req.prompt.clone(),
            system: req.system.clone(),
            temperature: req.options.temperature,
            max_tokens: req.options.num_predict,
        }
    }
}

impl From<RunResponse> for GenerateResponse {
    fn from(data: RunResponse) -> Self {
        Self {
            model: data.model,
            response: data.response,
            done: true,
            total_duration: data.total_duration_ms.map(|ms| ms.saturating_mul(1_000_000)),
            eval_count: data.eval_count,
            ..Default::default()
        }
    }
}

/// Talks to a running `promptlab-proxy` instead of the inference server.
pub struct ProxyClient {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl InferenceClient for ProxyClient {
    async fn generate(&self, req: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let resp = self
            .client
            .post(format!("{}/api/run", self.base_url))
            .json(&RunRequest::from(req))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let body = match serde_json::from_str::<ErrorPayload>(&text) {
                Ok(p) if !p.details.is_empty() => p.details,
                Ok(p) => p.error,
                Err(_) => text,
            };
            return Err(UpstreamError {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let data: RunResponse = resp.json().await?;
        Ok(data.into())
    }

    fn provider_name(&self) -> &'static str {
        "proxy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_request_from_generate() {
        let req = GenerateRequest::new("mistral:7b", "q")
            .with_temperature(Some(0.2))
            .with_num_predict(Some(64));
        let body = serde_json::to_value(RunRequest::from(&req)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"model": "mistral:7b", "prompt": "q", "temperature": 0.2, "maxTokens": 64})
        );
    }

    #[test]
    fn test_run_response_duration_to_nanos() {
        let out = GenerateResponse::from(RunResponse {
            response: "ok".into(),
            model: "m".into(),
            total_duration_ms: Some(1500),
            eval_count: Some(3),
        });
        assert_eq!(out.total_duration, Some(1_500_000_000));
        assert_eq!(out.eval_count, Some(3));
        assert!(out.done);

        // saturates instead of overflowing
        let huge = GenerateResponse::from(RunResponse {
            total_duration_ms: Some(u64::MAX),
            ..Default::default()
        });
        assert_eq!(huge.total_duration, Some(u64::MAX));
    }
}
