use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

fn promptlab(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("promptlab").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("PROMPTLAB_STORE")
        .env_remove("PROMPTLAB_OLLAMA_URL")
        .env_remove("PROMPTLAB_CONFIG")
        .args(["--store", "file", "--db"])
        .arg(dir.path().join("store"));
    cmd
}

#[test]
fn test_init_writes_sample_config() {
    let dir = TempDir::new().unwrap();
    promptlab(&dir)
        .args(["init", "--gitignore"])
        .assert()
        .success()
        .stderr(contains("created promptlab.yaml"));

    let cfg = std::fs::read_to_string(dir.path().join("promptlab.yaml")).unwrap();
    assert!(cfg.contains("configVersion: 1"));
    assert!(dir.path().join(".gitignore").exists());

    promptlab(&dir)
        .arg("init")
        .assert()
        .success()
        .stderr(contains("already exists"));
}

#[test]
fn test_experiment_lifecycle() {
    let dir = TempDir::new().unwrap();
    promptlab(&dir)
        .args(["experiment", "new", "Summaries"])
        .assert()
        .success();
    promptlab(&dir).args(["experiment", "new"]).assert().success();

    promptlab(&dir)
        .args(["experiment", "list"])
        .assert()
        .success()
        .stdout(contains("Summaries"))
        .stdout(contains("* Experiment 2"));

    promptlab(&dir)
        .args(["experiment", "rename", "Summaries", "Digest"])
        .assert()
        .success();
    promptlab(&dir)
        .args(["experiment", "use", "Digest"])
        .assert()
        .success()
        .stderr(contains("active experiment: Digest"));

    promptlab(&dir)
        .args(["experiment", "show"])
        .assert()
        .success()
        .stdout(contains("Digest"))
        .stdout(contains("No runs yet"));
}

#[test]
fn test_submit_score_and_filter() {
    let dir = TempDir::new().unwrap();
    promptlab(&dir)
        .args(["submit", "hello world", "--provider", "fake"])
        .assert()
        .success()
        .stdout(contains("#Run1"))
        .stdout(contains("echo: hello world"));
    promptlab(&dir)
        .args([
            "submit",
            "second try",
            "--provider",
            "fake",
            "--model",
            "mistral:7b",
            "--temperature",
            "0.2",
        ])
        .assert()
        .success();

    promptlab(&dir).args(["score", "2", "8"]).assert().success();
    promptlab(&dir)
        .args(["tag", "set", "#Run2", "accurate", "4"])
        .assert()
        .success();

    promptlab(&dir)
        .args(["runs", "--score-min", "5"])
        .assert()
        .success()
        .stdout(contains("#Run2"))
        .stdout(contains("#Run1").not());

    promptlab(&dir)
        .args(["runs", "--tag", "Accurate", "--weighted-tags", "--format", "json"])
        .assert()
        .success()
        .stdout(contains("\"runNumber\": 2"));

    promptlab(&dir)
        .args(["compare"])
        .assert()
        .success()
        .stdout(contains("Model → mistral:7b to llama3.2:3b"));

    promptlab(&dir)
        .args(["experiment", "show", "--format", "json"])
        .assert()
        .success()
        .stdout(contains("\"runsCount\": 2"))
        .stdout(contains("\"bestScore\": 8.0"));
}

#[test]
fn test_invalid_parameters_exit_with_config_error() {
    let dir = TempDir::new().unwrap();
    promptlab(&dir)
        .args(["submit", "hi", "--provider", "fake", "--temperature", "5"])
        .assert()
        .code(2)
        .stderr(contains("temperature"));

    promptlab(&dir)
        .args(["experiment", "list"])
        .assert()
        .success()
        .stdout(contains("No experiments yet"));

    promptlab(&dir)
        .args(["score", "1", "3"])
        .assert()
        .code(2);
}

#[test]
fn test_blank_prompt_leaves_store_empty() {
    let dir = TempDir::new().unwrap();
    promptlab(&dir)
        .args(["submit", "   ", "--provider", "fake"])
        .assert()
        .success()
        .stderr(contains("empty prompt"));

    promptlab(&dir)
        .args(["experiment", "list"])
        .assert()
        .success()
        .stdout(contains("No experiments yet"));
}

#[test]
fn test_unreachable_server_records_error_run() {
    let dir = TempDir::new().unwrap();
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    promptlab(&dir)
        .args(["submit", "hi", "--base-url"])
        .arg(format!("http://127.0.0.1:{}", port))
        .assert()
        .code(1)
        .stdout(contains("#Run1"));

    promptlab(&dir)
        .args(["runs", "--format", "json"])
        .assert()
        .success()
        .stdout(contains("\"status\": \"error\""));
}

#[test]
fn test_reuse_and_prefs() {
    let dir = TempDir::new().unwrap();
    promptlab(&dir)
        .args([
            "submit",
            "tune me",
            "--provider",
            "fake",
            "--model",
            "mistral:7b",
            "--max-tokens",
            "64",
        ])
        .assert()
        .success();

    // eval_count from the fake client replaces the requested limit
    promptlab(&dir)
        .args(["reuse", "1"])
        .assert()
        .success()
        .stdout(contains("tune me"));

    promptlab(&dir)
        .args(["prefs", "--format", "json"])
        .assert()
        .success()
        .stdout(contains("\"model\": \"mistral:7b\""))
        .stdout(contains("\"maxTokens\": 3"));

    promptlab(&dir)
        .args(["prefs", "--model", "mistral:7"])
        .assert()
        .success()
        .stderr(contains("did you mean 'mistral:7b'"));

    promptlab(&dir)
        .args(["models"])
        .assert()
        .success()
        .stdout(contains("llama3.2:3b"));
}
