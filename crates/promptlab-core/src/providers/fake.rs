use super::{GenerateRequest, GenerateResponse, InferenceClient};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub enum FakeReply {
    Text {
        response: String,
        total_duration_ns: Option<u64>,
        eval_count: Option<u32>,
    },
    Fail(String),
}

impl FakeReply {
    pub fn text(response: &str) -> Self {
        FakeReply::Text {
            response: response.to_string(),
            total_duration_ns: None,
            eval_count: None,
        }
    }
}

/// Deterministic client: pops queued replies, then echoes the prompt.
#[derive(Default)]
pub struct FakeClient {
    replies: Mutex<VecDeque<FakeReply>>,
    seen: Mutex<Vec<GenerateRequest>>,
}

impl FakeClient {
    pub fn echo() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: Vec<FakeReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl InferenceClient for FakeClient {
    async fn generate(&self, req: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(req.clone());
        }
        let next = self.replies.lock().ok().and_then(|mut q| q.pop_front());

        match next {
            Some(FakeReply::Fail(msg)) => anyhow::bail!("{}", msg),
            Some(FakeReply::Text {
                response,
                total_duration_ns,
                eval_count,
            }) => Ok(GenerateResponse {
                model: req.model.clone(),
                response,
                done: true,
                total_duration: total_duration_ns,
                eval_count,
                ..Default::default()
            }),
            None => Ok(GenerateResponse {
                model: req.model.clone(),
                response: format!("echo: {}", req.prompt),
                done: true,
                eval_count: Some(req.prompt.split_whitespace().count() as u32 + 1),
                ..Default::default()
            }),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
