use crate::model::Run;
use serde::Serialize;

pub const SEPARATOR: &str = "  |  ";
pub const NO_DIFFERENCES: &str = "No differences detected";
const ABSENT: &str = "n a";

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// One-line delta between two runs, fields in a fixed order:
/// model, tokens, temperature, latency.
pub fn summarize(left: Option<&Run>, right: Option<&Run>) -> String {
    let (Some(a), Some(b)) = (left, right) else {
        return String::new();
    };

    let mut parts: Vec<String> = Vec::new();

    if a.model_name != b.model_name {
        parts.push(format!("Model → {} to {}", a.model_name, b.model_name));
    }

    let (a_tok, b_tok) = (a.tokens.unwrap_or(0), b.tokens.unwrap_or(0));
    if a_tok != b_tok {
        parts.push(format!("Tokens → {} to {}", a_tok, b_tok));
    }

    let (a_temp, b_temp) = (a.temperature.unwrap_or(0.0), b.temperature.unwrap_or(0.0));
    if a_temp != b_temp {
        parts.push(format!("Temp → {} to {}", a_temp, b_temp));
    }

    let a_lat = a.latency_secs().map(round1);
    let b_lat = b.latency_secs().map(round1);
    if a_lat != b_lat {
        parts.push(format!(
            "Latency → {} to {}",
            show_latency(a_lat),
            show_latency(b_lat)
        ));
    }

    if parts.is_empty() {
        NO_DIFFERENCES.to_string()
    } else {
        parts.join(SEPARATOR)
    }
}

fn show_latency(v: Option<f64>) -> String {
    v.map(|s| s.to_string()).unwrap_or_else(|| ABSENT.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOption {
    pub value: String,
    pub label: String,
}

/// Left/right selection for comparison mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunPicker {
    pub left: Option<String>,
    pub right: Option<String>,
}

impl RunPicker {
    pub fn options(runs: &[Run]) -> Vec<RunOption> {
        runs.iter()
            .map(|r| RunOption {
                value: r.id.clone(),
                label: r.label(),
            })
            .collect()
    }

    /// Most recent run on the left, the one before it on the right.
    pub fn defaults(runs: &[Run]) -> Self {
        let mut recent: Vec<&Run> = runs.iter().collect();
        recent.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.run_number.cmp(&a.run_number))
        });
        let left = recent.first().map(|r| r.id.clone());
        let right = recent.get(1).or(recent.first()).map(|r| r.id.clone());
        Self { left, right }
    }

    /// Keeps selections that still exist, falls back to the defaults otherwise.
    pub fn reconcile(&self, runs: &[Run]) -> Self {
        if runs.is_empty() {
            return Self::default();
        }
        let fallback = Self::defaults(runs);
        let keep = |sel: &Option<String>| {
            sel.as_ref()
                .filter(|id| runs.iter().any(|r| &r.id == *id))
                .cloned()
        };
        Self {
            left: keep(&self.left).or(fallback.left),
            right: keep(&self.right).or(fallback.right),
        }
    }

    pub fn select_by_number(runs: &[Run], run_number: u32) -> Option<String> {
        runs.iter()
            .find(|r| r.run_number == run_number)
            .map(|r| r.id.clone())
    }

    pub fn resolve<'a>(&self, runs: &'a [Run]) -> (Option<&'a Run>, Option<&'a Run>) {
        let find = |sel: &Option<String>| {
            sel.as_ref()
                .and_then(|id| runs.iter().find(|r| &r.id == id))
        };
        (find(&self.left), find(&self.right))
    }

    pub fn summary(&self, runs: &[Run]) -> String {
        let (l, r) = self.resolve(runs);
        summarize(l, r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{seed_tags, RunStatus};

    fn run(n: u32, model: &str, tokens: u32, temp: f64, latency_ms: Option<f64>) -> Run {
        Run {
            id: format!("r{}", n),
            experiment_id: "e1".into(),
            run_number: n,
            status: RunStatus::Complete,
            model_name: model.into(),
            temperature: Some(temp),
            tokens: Some(tokens),
            prompt: "p".into(),
            response: "r".into(),
            latency_ms,
            score: 0.0,
            tags: seed_tags(),
            notes: String::new(),
            created_at: n as i64,
            updated_at: n as i64,
        }
    }

    #[test]
    fn test_only_tokens_differ() {
        let l = run(1, "m1", 100, 0.5, Some(1230.0));
        let r = run(2, "m1", 200, 0.5, Some(1230.0));
        assert_eq!(summarize(Some(&l), Some(&r)), "Tokens → 100 to 200");
    }

    #[test]
    fn test_all_fields_in_order() {
        let l = run(1, "llama3.2:3b", 305, 0.9, Some(1500.0));
        let r = run(2, "mistral:7b", 256, 0.7, None);
        assert_eq!(
            summarize(Some(&l), Some(&r)),
            "Model → llama3.2:3b to mistral:7b  |  Tokens → 305 to 256  |  Temp → 0.9 to 0.7  |  Latency → 1.5 to n a"
        );
    }

    #[test]
    fn test_latency_compared_after_rounding() {
        let l = run(1, "m", 1, 0.5, Some(1210.0));
        let r = run(2, "m", 1, 0.5, Some(1240.0));
        assert_eq!(summarize(Some(&l), Some(&r)), NO_DIFFERENCES);

        let r = run(2, "m", 1, 0.5, Some(2000.0));
        assert_eq!(summarize(Some(&l), Some(&r)), "Latency → 1.2 to 2");
    }

    #[test]
    fn test_missing_side_is_empty() {
        let l = run(1, "m", 1, 0.5, None);
        assert_eq!(summarize(None, None), "");
        assert_eq!(summarize(Some(&l), None), "");
    }

    #[test]
    fn test_picker_defaults_and_reconcile() {
        let runs = vec![
            run(1, "m", 1, 0.1, None),
            run(2, "m", 1, 0.2, None),
            run(3, "m", 1, 0.3, None),
        ];
        let p = RunPicker::defaults(&runs);
        assert_eq!(p.left.as_deref(), Some("r3"));
        assert_eq!(p.right.as_deref(), Some("r2"));

        let single = vec![run(1, "m", 1, 0.1, None)];
        let p1 = RunPicker::defaults(&single);
        assert_eq!(p1.left, p1.right);

        let chosen = RunPicker {
            left: Some("r1".into()),
            right: Some("gone".into()),
        };
        let fixed = chosen.reconcile(&runs);
        assert_eq!(fixed.left.as_deref(), Some("r1"));
        assert_eq!(fixed.right.as_deref(), Some("r2"));
        assert_eq!(fixed.summary(&runs), "Temp → 0.1 to 0.2");

        assert_eq!(chosen.reconcile(&[]), RunPicker::default());
    }

    #[test]
    fn test_options_are_labelled_by_run_number() {
        let runs = vec![run(4, "m", 1, 0.1, None)];
        let opts = RunPicker::options(&runs);
        assert_eq!(opts[0].label, "#Run4");
        assert_eq!(RunPicker::select_by_number(&runs, 4).as_deref(), Some("r4"));
        assert_eq!(RunPicker::select_by_number(&runs, 9), None);
    }
}
