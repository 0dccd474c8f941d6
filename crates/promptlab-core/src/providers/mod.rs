use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod fake;
pub mod ollama;
pub mod proxy;

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:3001";

const NS_PER_MS: f64 = 1_000_000.0;

pub fn ns_to_ms(ns: u64) -> f64 {
    ns as f64 / NS_PER_MS
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerateOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

/// Body of `POST /api/generate`. Streaming is always off.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub stream: bool,
    #[serde(default)]
    pub options: GenerateOptions,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            stream: false,
            options: GenerateOptions::default(),
        }
    }

    /// Blank system prompts are dropped rather than sent.
    pub fn with_system(mut self, system: Option<&str>) -> Self {
        self.system = system
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.options.temperature = temperature;
        self
    }

    pub fn with_num_predict(mut self, num_predict: Option<u32>) -> Self {
        self.options.num_predict = num_predict;
        self
    }
}

/// Non-streaming generate response. Durations are nanoseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerateResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_duration: Option<u64>,
}

impl GenerateResponse {
    pub fn total_duration_ms(&self) -> Option<f64> {
        self.total_duration.map(ns_to_ms)
    }

    pub fn load_duration_ms(&self) -> Option<f64> {
        self.load_duration.map(ns_to_ms)
    }
}

#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn generate(&self, req: &GenerateRequest) -> anyhow::Result<GenerateResponse>;
    fn provider_name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Ollama,
    Proxy,
    Fake,
}

impl ProviderKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Some(ProviderKind::Ollama),
            "proxy" => Some(ProviderKind::Proxy),
            "fake" => Some(ProviderKind::Fake),
            _ => None,
        }
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            ProviderKind::Proxy => DEFAULT_PROXY_URL,
            _ => DEFAULT_OLLAMA_URL,
        }
    }
}

pub fn build_client(kind: ProviderKind, base_url: &str) -> Arc<dyn InferenceClient> {
    match kind {
        ProviderKind::Ollama => Arc::new(ollama::OllamaClient::new(base_url)),
        ProviderKind::Proxy => Arc::new(proxy::ProxyClient::new(base_url)),
        ProviderKind::Fake => Arc::new(fake::FakeClient::echo()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let req = GenerateRequest::new("llama3.2:3b", "hi")
            .with_system(Some("  "))
            .with_temperature(Some(0.9))
            .with_num_predict(Some(305));
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "model": "llama3.2:3b",
                "prompt": "hi",
                "stream": false,
                "options": { "temperature": 0.9, "num_predict": 305 }
            })
        );

        let req = req.with_system(Some("be brief"));
        assert_eq!(req.system.as_deref(), Some("be brief"));
    }

    #[test]
    fn test_response_durations_convert_to_ms() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"model":"m","created_at":"2024-01-01T00:00:00Z","response":"r","done":true,
                "total_duration":2500000000,"load_duration":1500000,"eval_count":42}"#,
        )
        .unwrap();
        assert_eq!(resp.total_duration_ms(), Some(2500.0));
        assert_eq!(resp.load_duration_ms(), Some(1.5));
        assert_eq!(resp.eval_count, Some(42));
        assert_eq!(resp.prompt_eval_count, None);
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(ProviderKind::parse("Ollama"), Some(ProviderKind::Ollama));
        assert_eq!(ProviderKind::parse("fake"), Some(ProviderKind::Fake));
        assert_eq!(ProviderKind::parse("openai"), None);
        assert_eq!(ProviderKind::Proxy.default_url(), DEFAULT_PROXY_URL);
    }
}
