use serde::{Deserialize, Serialize};

/// Labels every new run starts with, all unselected.
pub const SEED_TAG_LABELS: [&str; 4] = ["Accurate", "Concise", "Verbose", "Hallucinated"];

pub const TAG_UNSELECTED: i32 = -1;
pub const MAX_TAG_WEIGHT: i32 = 9;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// Response text shown while the inference call is in flight.
pub const PENDING_RESPONSE: &str = "Pending response";

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Pending,
    Complete,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Complete => "complete",
            RunStatus::Error => "error",
        }
    }

    /// A run leaves `pending` exactly once and never comes back.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (RunStatus::Pending, RunStatus::Complete) | (RunStatus::Pending, RunStatus::Error)
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn unselected() -> i32 {
    TAG_UNSELECTED
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: String,
    pub label: String,
    /// -1 not selected, 0 selected without weight, 1..=9 weighted.
    #[serde(default = "unselected")]
    pub weight: i32,
}

impl Tag {
    pub fn new(label: impl Into<String>, weight: i32) -> Self {
        Self {
            id: new_id(),
            label: label.into(),
            weight,
        }
    }

    pub fn is_selected(&self) -> bool {
        self.weight >= 0
    }

    pub fn has_weight(&self) -> bool {
        self.weight > 0
    }

    pub fn matches_label(&self, label: &str) -> bool {
        self.label.to_lowercase() == label.to_lowercase()
    }
}

pub fn seed_tags() -> Vec<Tag> {
    SEED_TAG_LABELS
        .iter()
        .map(|label| Tag::new(*label, TAG_UNSELECTED))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: String,
    pub experiment_id: String,
    pub run_number: u32,
    pub status: RunStatus,

    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u32>,

    pub prompt: String,
    #[serde(default)]
    pub response: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,

    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub notes: String,

    pub created_at: i64,
    pub updated_at: i64,
}

impl Run {
    pub fn label(&self) -> String {
        format!("#Run{}", self.run_number)
    }

    pub fn latency_secs(&self) -> Option<f64> {
        self.latency_ms.map(|ms| ms / 1000.0)
    }

    pub fn selected_tag_labels(&self) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|t| t.is_selected())
            .map(|t| t.label.as_str())
            .collect()
    }

    pub fn find_tag(&self, label: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.matches_label(label))
    }

    pub fn has_notes(&self) -> bool {
        !self.notes.trim().is_empty()
    }
}

/// The whole persisted state: one document per store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    #[serde(default)]
    pub experiments: Vec<Experiment>,
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl Document {
    pub fn runs_for<'a>(&'a self, experiment_id: &'a str) -> impl Iterator<Item = &'a Run> + 'a {
        self.runs
            .iter()
            .filter(move |r| r.experiment_id == experiment_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunDraft {
    pub experiment_id: String,
    pub model_name: String,
    pub temperature: Option<f64>,
    pub tokens: Option<u32>,
    pub prompt: String,
}

/// Result of a finished inference call, ready to be written onto a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub response: String,
    pub latency_ms: f64,
    pub tokens: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentStats {
    pub runs_count: usize,
    pub best_score: f64,
    pub latency_avg: f64,
    pub avg_score: f64,
}

/// Sidebar-style preview of a run.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunPreview {
    pub id: String,
    pub run_number: u32,
    pub model_name: String,
    pub temperature: Option<f64>,
    pub tokens: Option<u32>,
    pub latency_sec: f64,
    pub score: f64,
    pub prompt_preview: String,
    pub tags: Vec<String>,
    pub has_notes: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentOverview {
    pub id: String,
    pub name: String,
    pub run_count: usize,
    pub runs: Vec<RunPreview>,
}

/// Per-store user preferences that survive between invocations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionPrefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_experiment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}
