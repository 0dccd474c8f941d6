use super::{GenerateRequest, GenerateResponse, InferenceClient};
use crate::errors::UpstreamError;
use async_trait::async_trait;

pub struct OllamaClient {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

#[async_trait]
impl InferenceClient for OllamaClient {
    async fn generate(&self, req: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let resp = self
            .client
            .post(self.generate_url())
            .header("Content-Type", "application/json")
            .json(req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UpstreamError {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let data: GenerateResponse = resp.json().await?;
        tracing::debug!(
            event = "ollama.generate",
            model = %data.model,
            eval_count = ?data.eval_count,
            total_duration_ns = ?data.total_duration
        );
        Ok(data)
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }
}
