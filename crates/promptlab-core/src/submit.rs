use crate::errors::ConfigError;
use crate::model::{Completion, Run, RunDraft, PENDING_RESPONSE};
use crate::providers::{GenerateRequest, InferenceClient};
use crate::repository::{Repository, RunCommand};
use std::sync::Arc;
use std::time::Instant;

pub const MIN_TEMPERATURE: f64 = 0.0;
pub const MAX_TEMPERATURE: f64 = 2.0;
pub const MIN_MAX_TOKENS: u32 = 1;
pub const MAX_MAX_TOKENS: u32 = 4096;

/// Response text for failures that carry no message of their own.
pub const REQUEST_FAILED: &str = "Request failed";

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRequest {
    pub experiment_id: String,
    pub model: String,
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl SubmitRequest {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.temperature.is_finite()
            || !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&self.temperature)
        {
            return Err(ConfigError(format!(
                "temperature {} out of range ({}..={})",
                self.temperature, MIN_TEMPERATURE, MAX_TEMPERATURE
            )));
        }
        if !(MIN_MAX_TOKENS..=MAX_MAX_TOKENS).contains(&self.max_tokens) {
            return Err(ConfigError(format!(
                "max tokens {} out of range ({}..={})",
                self.max_tokens, MIN_MAX_TOKENS, MAX_MAX_TOKENS
            )));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError("model name is empty".into()));
        }
        Ok(())
    }
}

/// Sends prompts and records them as runs.
///
/// Each submission is a two-phase write: [`Submitter::begin`] stores a pending
/// run before the inference call, then exactly one of [`Submitter::complete`]
/// or [`Submitter::fail`] resolves it.
#[derive(Clone)]
pub struct Submitter {
    repo: Repository,
    client: Arc<dyn InferenceClient>,
}

impl Submitter {
    pub fn new(repo: Repository, client: Arc<dyn InferenceClient>) -> Self {
        Self { repo, client }
    }

    pub fn begin(&self, draft: RunDraft) -> anyhow::Result<Run> {
        let run = self.repo.insert_run(draft, PENDING_RESPONSE.to_string())?;
        tracing::info!(
            event = "run.begin",
            run_id = %run.id,
            run_number = run.run_number,
            model = %run.model_name
        );
        Ok(run)
    }

    pub fn complete(&self, run_id: &str, done: Completion) -> anyhow::Result<Option<Run>> {
        tracing::info!(event = "run.complete", run_id = %run_id, latency_ms = done.latency_ms);
        self.repo.update_run(run_id, RunCommand::Complete(done))
    }

    pub fn fail(&self, run_id: &str, message: &str) -> anyhow::Result<Option<Run>> {
        tracing::warn!(event = "run.fail", run_id = %run_id, error = %message);
        self.repo.update_run(run_id, RunCommand::Fail(message.to_string()))
    }

    /// Runs one prompt through the inference client.
    ///
    /// Returns `Ok(None)` without touching the store when the prompt is blank,
    /// and also when the pending run was deleted before the call returned.
    /// Inference failures end up on the run (status `error`), not in the `Err`.
    pub async fn submit(&self, req: SubmitRequest) -> anyhow::Result<Option<Run>> {
        let prompt = req.prompt.trim();
        if prompt.is_empty() {
            return Ok(None);
        }
        req.validate()?;

        let run = self.begin(RunDraft {
            experiment_id: req.experiment_id.clone(),
            model_name: req.model.clone(),
            temperature: Some(req.temperature),
            tokens: Some(req.max_tokens),
            prompt: prompt.to_string(),
        })?;

        let gen = GenerateRequest::new(req.model.as_str(), prompt)
            .with_system(req.system_prompt.as_deref())
            .with_temperature(Some(req.temperature))
            .with_num_predict(Some(req.max_tokens));

        let start = Instant::now();
        match self.client.generate(&gen).await {
            Ok(data) => {
                let latency_ms = data
                    .total_duration_ms()
                    .unwrap_or_else(|| start.elapsed().as_secs_f64() * 1000.0);
                self.complete(
                    &run.id,
                    Completion {
                        response: data.response,
                        latency_ms,
                        tokens: data.eval_count,
                    },
                )
            }
            Err(e) => self.fail(&run.id, &failure_message(&e)),
        }
    }
}

fn failure_message(e: &anyhow::Error) -> String {
    let msg = e.to_string();
    if msg.trim().is_empty() {
        REQUEST_FAILED.to_string()
    } else {
        msg
    }
}
