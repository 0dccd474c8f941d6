use promptlab_core::model::{RunStatus, PENDING_RESPONSE};
use async_trait::async_trait;
use promptlab_core::providers::fake::{FakeClient, FakeReply};
use promptlab_core::providers::{GenerateRequest, GenerateResponse, InferenceClient};
use promptlab_core::repository::Repository;
use promptlab_core::storage::MemoryBackend;
use promptlab_core::submit::{SubmitRequest, Submitter, REQUEST_FAILED};
use std::sync::Arc;

fn setup(client: FakeClient) -> (Repository, Arc<FakeClient>, Submitter, String) {
    let repo = Repository::new(Arc::new(MemoryBackend::default()));
    let exp = repo.create_experiment(None).unwrap();
    let client = Arc::new(client);
    let submitter = Submitter::new(repo.clone(), client.clone());
    (repo, client, submitter, exp.id)
}

fn req(experiment_id: &str, prompt: &str) -> SubmitRequest {
    SubmitRequest {
        experiment_id: experiment_id.into(),
        model: "llama3.2:3b".into(),
        prompt: prompt.into(),
        system_prompt: None,
        temperature: 0.9,
        max_tokens: 305,
    }
}

#[tokio::test]
async fn test_submit_completes_with_server_timing() {
    let (repo, _client, submitter, exp) = setup(FakeClient::with_replies(vec![FakeReply::Text {
        response: "Paris".into(),
        total_duration_ns: Some(1_500_000_000),
        eval_count: Some(42),
    }]));

    let run = submitter
        .submit(req(&exp, "  Capital of France?  "))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(run.status, RunStatus::Complete);
    assert_eq!(run.response, "Paris");
    assert_eq!(run.prompt, "Capital of France?");
    assert_eq!(run.latency_ms, Some(1500.0));
    assert_eq!(run.tokens, Some(42));
    assert_eq!(run.temperature, Some(0.9));
    assert_eq!(repo.list_runs(&exp), vec![run]);
}

#[tokio::test]
async fn test_submit_keeps_requested_tokens_without_eval_count() {
    let (_repo, _client, submitter, exp) =
        setup(FakeClient::with_replies(vec![FakeReply::text("ok")]));

    let run = submitter.submit(req(&exp, "hi")).await.unwrap().unwrap();
    assert_eq!(run.tokens, Some(305));
    // no server timing, so wall-clock latency is recorded
    assert!(run.latency_ms.is_some());
}

#[tokio::test]
async fn test_submit_failure_lands_on_run() {
    let (repo, _client, submitter, exp) = setup(FakeClient::with_replies(vec![
        FakeReply::Fail("model 'nope' not found".into()),
        FakeReply::Fail(String::new()),
    ]));

    let first = submitter.submit(req(&exp, "a")).await.unwrap().unwrap();
    assert_eq!(first.status, RunStatus::Error);
    assert_eq!(first.response, "model 'nope' not found");
    assert_eq!(first.latency_ms, None);

    let second = submitter.submit(req(&exp, "b")).await.unwrap().unwrap();
    assert_eq!(second.response, REQUEST_FAILED);
    assert_eq!(second.run_number, 2);

    let stats = repo.experiment_stats(&exp);
    assert_eq!(stats.runs_count, 2);
    assert_eq!(stats.latency_avg, 0.0);
}

#[tokio::test]
async fn test_blank_prompt_is_ignored() {
    let (repo, client, submitter, exp) = setup(FakeClient::echo());
    assert!(submitter.submit(req(&exp, "   ")).await.unwrap().is_none());
    assert!(repo.list_runs(&exp).is_empty());
    assert!(client.requests().is_empty());
}

/// Deletes every run of the experiment while the request is in flight.
struct DeletingClient {
    repo: Repository,
    experiment_id: String,
}

#[async_trait]
impl InferenceClient for DeletingClient {
    async fn generate(&self, _req: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        for run in self.repo.list_runs(&self.experiment_id) {
            self.repo.delete_run(&run.id)?;
        }
        Ok(GenerateResponse {
            response: "late".into(),
            done: true,
            ..Default::default()
        })
    }

    fn provider_name(&self) -> &'static str {
        "deleting"
    }
}

#[tokio::test]
async fn test_run_deleted_in_flight_yields_none() {
    let repo = Repository::new(Arc::new(MemoryBackend::default()));
    let exp = repo.create_experiment(None).unwrap().id;
    let client = Arc::new(DeletingClient {
        repo: repo.clone(),
        experiment_id: exp.clone(),
    });
    let submitter = Submitter::new(repo.clone(), client);

    assert!(submitter.submit(req(&exp, "hi")).await.unwrap().is_none());
    assert!(repo.list_runs(&exp).is_empty());
}

#[tokio::test]
async fn test_invalid_parameters_are_rejected_before_any_write() {
    let (repo, client, submitter, exp) = setup(FakeClient::echo());
    let bad = SubmitRequest {
        temperature: 3.0,
        ..req(&exp, "hi")
    };
    let err = submitter.submit(bad).await.unwrap_err();
    assert!(promptlab_core::errors::is_config_error(&err));
    assert!(repo.list_runs(&exp).is_empty());
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn test_request_carries_system_prompt_and_options() {
    let (_repo, client, submitter, exp) = setup(FakeClient::echo());
    let with_system = SubmitRequest {
        system_prompt: Some("Answer tersely.".into()),
        max_tokens: 64,
        ..req(&exp, "hello there")
    };
    let run = submitter.submit(with_system).await.unwrap().unwrap();
    assert_eq!(run.response, "echo: hello there");
    assert_ne!(run.response, PENDING_RESPONSE);

    let seen = client.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].system.as_deref(), Some("Answer tersely."));
    assert_eq!(seen[0].options.temperature, Some(0.9));
    assert_eq!(seen[0].options.num_predict, Some(64));
    assert!(!seen[0].stream);
}

#[tokio::test]
async fn test_pending_run_is_visible_before_completion() {
    let (repo, _client, submitter, exp) = setup(FakeClient::echo());
    let pending = submitter
        .begin(promptlab_core::model::RunDraft {
            experiment_id: exp.clone(),
            model_name: "m".into(),
            temperature: None,
            tokens: None,
            prompt: "p".into(),
        })
        .unwrap();
    let listed = repo.list_runs(&exp);
    assert_eq!(listed[0].status, RunStatus::Pending);
    assert_eq!(listed[0].response, PENDING_RESPONSE);

    submitter.fail(&pending.id, "boom").unwrap();
    // a second resolution is refused
    assert!(submitter.fail(&pending.id, "again").is_err());
    assert_eq!(repo.get_run(&pending.id).unwrap().response, "boom");
}
