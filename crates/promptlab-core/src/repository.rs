use crate::errors::RunError;
use crate::model::{
    new_id, now_ms, seed_tags, Completion, Document, Experiment, ExperimentOverview,
    ExperimentStats, Run, RunDraft, RunPreview, RunStatus, Tag, MAX_SCORE, MAX_TAG_WEIGHT,
    MIN_SCORE, TAG_UNSELECTED,
};
use crate::storage::{DocumentStore, StorageBackend};
use std::sync::Arc;

const PREVIEW_RUNS: usize = 5;
const PREVIEW_PROMPT_CHARS: usize = 80;

/// Typed edits applied to a single run by [`Repository::update_run`].
#[derive(Debug, Clone, PartialEq)]
pub enum RunCommand {
    SetScore(f64),
    SetTags(Vec<Tag>),
    /// Appends a selected tag (weight 0) unless the label already exists.
    AddTag(String),
    SetTagWeight { label: String, weight: i32 },
    SetNotes(String),
    Complete(Completion),
    Fail(String),
}

impl RunCommand {
    fn apply(self, run: &mut Run) -> Result<(), RunError> {
        match self {
            RunCommand::SetScore(score) => {
                if !score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&score) {
                    return Err(RunError::InvalidScore(score));
                }
                run.score = score;
            }
            RunCommand::SetTags(tags) => {
                if let Some(bad) = tags.iter().find(|t| !weight_in_range(t.weight)) {
                    return Err(RunError::InvalidWeight(bad.weight));
                }
                run.tags = tags;
            }
            RunCommand::AddTag(label) => {
                let label = label.trim();
                if !label.is_empty() && run.find_tag(label).is_none() {
                    run.tags.push(Tag::new(label, 0));
                }
            }
            RunCommand::SetTagWeight { label, weight } => {
                if !weight_in_range(weight) {
                    return Err(RunError::InvalidWeight(weight));
                }
                if let Some(tag) = run.tags.iter_mut().find(|t| t.matches_label(&label)) {
                    tag.weight = weight;
                }
            }
            RunCommand::SetNotes(notes) => run.notes = notes,
            RunCommand::Complete(done) => {
                transition(run, RunStatus::Complete)?;
                run.response = done.response;
                run.latency_ms = Some(done.latency_ms);
                if let Some(tokens) = done.tokens {
                    run.tokens = Some(tokens);
                }
            }
            RunCommand::Fail(message) => {
                transition(run, RunStatus::Error)?;
                run.response = message;
            }
        }
        Ok(())
    }
}

fn weight_in_range(weight: i32) -> bool {
    (TAG_UNSELECTED..=MAX_TAG_WEIGHT).contains(&weight)
}

fn transition(run: &mut Run, to: RunStatus) -> Result<(), RunError> {
    if !run.status.can_transition_to(to) {
        return Err(RunError::IllegalTransition {
            from: run.status,
            to,
        });
    }
    run.status = to;
    Ok(())
}

/// Experiment and run CRUD over the persisted document.
///
/// Every mutation is a full load-modify-save cycle against the store; there
/// is no caching and the last writer wins.
#[derive(Clone)]
pub struct Repository {
    store: DocumentStore,
}

impl Repository {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            store: DocumentStore::new(backend),
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn create_experiment(&self, name: Option<&str>) -> anyhow::Result<Experiment> {
        let mut doc = self.store.load();
        let now = now_ms();
        let exp = Experiment {
            id: new_id(),
            name: name
                .map(str::to_string)
                .unwrap_or_else(|| format!("Experiment {}", doc.experiments.len() + 1)),
            created_at: now,
            updated_at: now,
        };
        doc.experiments.insert(0, exp.clone());
        self.store.save(&doc)?;
        tracing::info!(event = "experiment.create", id = %exp.id, name = %exp.name);
        Ok(exp)
    }

    /// Returns `false` when no experiment has that id.
    pub fn rename_experiment(&self, id: &str, name: &str) -> anyhow::Result<bool> {
        let mut doc = self.store.load();
        let Some(exp) = doc.experiments.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        exp.name = name.to_string();
        exp.updated_at = now_ms();
        self.store.save(&doc)?;
        Ok(true)
    }

    pub fn list_experiments(&self) -> Vec<Experiment> {
        self.store.load().experiments
    }

    /// Exact id first, then the first experiment with exactly that name.
    pub fn find_experiment(&self, id_or_name: &str) -> Option<Experiment> {
        let experiments = self.list_experiments();
        experiments
            .iter()
            .find(|e| e.id == id_or_name)
            .or_else(|| experiments.iter().find(|e| e.name == id_or_name))
            .cloned()
    }

    pub fn list_runs(&self, experiment_id: &str) -> Vec<Run> {
        sorted_runs(&self.store.load(), experiment_id)
    }

    pub fn get_run(&self, id: &str) -> Option<Run> {
        self.store.load().runs.into_iter().find(|r| r.id == id)
    }

    pub fn create_run(&self, draft: RunDraft) -> anyhow::Result<Run> {
        self.insert_run(draft, String::new())
    }

    pub(crate) fn insert_run(&self, draft: RunDraft, response: String) -> anyhow::Result<Run> {
        let mut doc = self.store.load();
        let now = now_ms();
        let run_number = doc.runs_for(&draft.experiment_id).count() as u32 + 1;
        let run = Run {
            id: new_id(),
            experiment_id: draft.experiment_id,
            run_number,
            status: RunStatus::Pending,
            model_name: draft.model_name,
            temperature: draft.temperature,
            tokens: draft.tokens,
            prompt: draft.prompt,
            response,
            latency_ms: None,
            score: 0.0,
            tags: seed_tags(),
            notes: String::new(),
            created_at: now,
            updated_at: now,
        };
        doc.runs.push(run.clone());
        self.store.save(&doc)?;
        Ok(run)
    }

    /// Applies `cmd` to the run with `id`. Unknown ids are a no-op (`Ok(None)`);
    /// a rejected command leaves the stored document unchanged.
    pub fn update_run(&self, id: &str, cmd: RunCommand) -> anyhow::Result<Option<Run>> {
        let mut doc = self.store.load();
        let Some(slot) = doc.runs.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        let mut next = slot.clone();
        cmd.apply(&mut next)?;
        next.updated_at = now_ms();
        *slot = next.clone();
        self.store.save(&doc)?;
        Ok(Some(next))
    }

    pub fn delete_run(&self, id: &str) -> anyhow::Result<bool> {
        let mut doc = self.store.load();
        let before = doc.runs.len();
        doc.runs.retain(|r| r.id != id);
        if doc.runs.len() == before {
            return Ok(false);
        }
        self.store.save(&doc)?;
        Ok(true)
    }

    pub fn experiment_stats(&self, experiment_id: &str) -> ExperimentStats {
        stats_for(&self.list_runs(experiment_id))
    }

    pub fn experiment_overview(&self) -> Vec<ExperimentOverview> {
        let doc = self.store.load();
        doc.experiments
            .iter()
            .map(|e| {
                let runs = sorted_runs(&doc, &e.id);
                ExperimentOverview {
                    id: e.id.clone(),
                    name: e.name.clone(),
                    run_count: runs.len(),
                    runs: runs.iter().rev().take(PREVIEW_RUNS).map(preview).collect(),
                }
            })
            .collect()
    }
}

fn sorted_runs(doc: &Document, experiment_id: &str) -> Vec<Run> {
    let mut runs: Vec<Run> = doc.runs_for(experiment_id).cloned().collect();
    runs.sort_by_key(|r| r.run_number);
    runs
}

/// Latency averages only runs that recorded one; score averages every run.
pub fn stats_for(runs: &[Run]) -> ExperimentStats {
    let runs_count = runs.len();
    if runs_count == 0 {
        return ExperimentStats::default();
    }

    let best_score = runs.iter().map(|r| r.score).fold(f64::MIN, f64::max);

    let latencies: Vec<f64> = runs.iter().filter_map(|r| r.latency_ms).collect();
    let latency_avg = if latencies.is_empty() {
        0.0
    } else {
        latencies.iter().sum::<f64>() / latencies.len() as f64 / 1000.0
    };

    let avg_score = runs.iter().map(|r| r.score).sum::<f64>() / runs_count as f64;

    ExperimentStats {
        runs_count,
        best_score,
        latency_avg,
        avg_score,
    }
}

fn preview(r: &Run) -> RunPreview {
    RunPreview {
        id: r.id.clone(),
        run_number: r.run_number,
        model_name: r.model_name.clone(),
        temperature: r.temperature,
        tokens: r.tokens,
        latency_sec: r.latency_secs().unwrap_or(0.0),
        score: r.score,
        prompt_preview: truncate_chars(&r.prompt, PREVIEW_PROMPT_CHARS),
        tags: r
            .selected_tag_labels()
            .into_iter()
            .map(str::to_string)
            .collect(),
        has_notes: r.has_notes(),
    }
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max).collect();
        out.push_str("...");
        out
    }
}
