use crate::config::ModelInfo;
use crate::model::{Experiment, ExperimentOverview, ExperimentStats, Run, RunStatus};
use std::fmt::Write;

fn status_icon(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Pending => "⏳",
        RunStatus::Complete => "✅",
        RunStatus::Error => "❌",
    }
}

fn fmt_opt<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "-".into())
}

/// One line per run, `#RunN` first.
pub fn run_line(r: &Run) -> String {
    let latency = r
        .latency_secs()
        .map(|s| format!("{:.1}s", s))
        .unwrap_or_else(|| "-".into());
    let tags = r.selected_tag_labels();
    let mut line = format!(
        "{} {:<8} {:<14} temp={:<4} tokens={:<5} {:>6}  score={}",
        status_icon(r.status),
        r.label(),
        r.model_name,
        fmt_opt(r.temperature),
        fmt_opt(r.tokens),
        latency,
        r.score
    );
    if !tags.is_empty() {
        let _ = write!(line, "  [{}]", tags.join(", "));
    }
    if r.has_notes() {
        line.push_str("  ✎");
    }
    line
}

pub fn run_list(runs: &[&Run]) -> String {
    if runs.is_empty() {
        return "No runs yet".to_string();
    }
    runs.iter().map(|r| run_line(r)).collect::<Vec<_>>().join("\n")
}

/// Full view of a single run.
pub fn run_card(r: &Run) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}  ({})", status_icon(r.status), r.label(), r.status);
    let _ = writeln!(out, "  Model:       {}", r.model_name);
    let _ = writeln!(out, "  Temperature: {}", fmt_opt(r.temperature));
    let _ = writeln!(out, "  Tokens:      {}", fmt_opt(r.tokens));
    if let Some(s) = r.latency_secs() {
        let _ = writeln!(out, "  Latency:     {:.2}s", s);
    }
    let _ = writeln!(out, "  Score:       {}", r.score);
    let weighted: Vec<String> = r
        .tags
        .iter()
        .filter(|t| t.is_selected())
        .map(|t| format!("{}({})", t.label, t.weight))
        .collect();
    if !weighted.is_empty() {
        let _ = writeln!(out, "  Tags:        {}", weighted.join(", "));
    }
    let _ = writeln!(out, "\nPrompt:\n{}", r.prompt);
    let _ = writeln!(out, "\nResponse:\n{}", r.response);
    if r.has_notes() {
        let _ = writeln!(out, "\nNotes:\n{}", r.notes);
    }
    out
}

pub fn stats(s: &ExperimentStats) -> String {
    format!(
        "Runs: {}  |  Best score: {}  |  Avg score: {:.1}  |  Avg latency: {:.1}s",
        s.runs_count, s.best_score, s.avg_score, s.latency_avg
    )
}

pub fn experiment_list(experiments: &[Experiment], active: Option<&str>) -> String {
    if experiments.is_empty() {
        return "No experiments yet".to_string();
    }
    experiments
        .iter()
        .map(|e| {
            let marker = if active == Some(e.id.as_str()) { "*" } else { " " };
            format!("{} {}  {}", marker, e.name, e.id)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn overview(items: &[ExperimentOverview]) -> String {
    let mut out = String::new();
    for e in items {
        let _ = writeln!(out, "{} ({} runs)", e.name, e.run_count);
        for p in &e.runs {
            let _ = writeln!(
                out,
                "  #Run{:<4} {:<14} {:.1}s  score={}  {}",
                p.run_number, p.model_name, p.latency_sec, p.score, p.prompt_preview
            );
        }
    }
    out.trim_end().to_string()
}

pub fn comparison(left: &Run, right: &Run, summary: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  vs  {}", left.label(), right.label());
    let _ = writeln!(out, "{}", summary);
    let _ = writeln!(out, "\n--- {} ({}) ---\n{}", left.label(), left.model_name, left.response);
    let _ = write!(out, "\n--- {} ({}) ---\n{}", right.label(), right.model_name, right.response);
    out
}

pub fn model_list(models: &[ModelInfo], current: &str) -> String {
    models
        .iter()
        .map(|m| {
            let marker = if m.name == current { "*" } else { " " };
            format!(
                "{} {:<14} {:<4} {:<7} {}",
                marker, m.name, m.param_size, m.quant, m.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
