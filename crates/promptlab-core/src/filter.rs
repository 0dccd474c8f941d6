use crate::model::{Run, Tag};
use serde::{Deserialize, Serialize};

/// Which tags count when matching a tag label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagMatch {
    /// weight >= 0
    #[default]
    Selected,
    /// weight > 0
    Weighted,
}

impl TagMatch {
    fn accepts(&self, tag: &Tag) -> bool {
        match self {
            TagMatch::Selected => tag.is_selected(),
            TagMatch::Weighted => tag.has_weight(),
        }
    }
}

/// Editable filter inputs as typed by the user, not yet parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterDraft {
    pub model: String,
    pub tag: String,
    pub score_min: String,
    pub score_max: String,
    pub temp_min: String,
    pub temp_max: String,
    pub tokens_min: String,
    pub tokens_max: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    pub fn parse(min: &str, max: &str) -> Self {
        Self {
            min: parse_bound(min),
            max: parse_bound(max),
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        self.min.map_or(true, |m| v >= m) && self.max.map_or(true, |m| v <= m)
    }

    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Blank or non-finite bounds mean "no bound".
pub fn parse_bound(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// An applied filter. Every present predicate must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunFilter {
    pub model: Option<String>,
    pub tag: Option<String>,
    pub score: Range,
    pub temperature: Range,
    pub tokens: Range,
    pub tag_match: TagMatch,
}

impl RunFilter {
    pub fn from_draft(draft: &FilterDraft, tag_match: TagMatch) -> Self {
        Self {
            model: non_blank(&draft.model),
            tag: non_blank(&draft.tag),
            score: Range::parse(&draft.score_min, &draft.score_max),
            temperature: Range::parse(&draft.temp_min, &draft.temp_max),
            tokens: Range::parse(&draft.tokens_min, &draft.tokens_max),
            tag_match,
        }
    }

    pub fn matches(&self, run: &Run) -> bool {
        let ok_model = self.model.as_ref().map_or(true, |m| run.model_name == *m);
        let ok_tag = self.tag.as_ref().map_or(true, |label| {
            run.tags
                .iter()
                .any(|t| self.tag_match.accepts(t) && t.label == *label)
        });
        ok_model
            && ok_tag
            && self.score.contains(run.score)
            && self.temperature.contains(run.temperature.unwrap_or(0.0))
            && self.tokens.contains(run.tokens.unwrap_or(0) as f64)
    }

    pub fn apply<'a>(&self, runs: &'a [Run]) -> Vec<&'a Run> {
        runs.iter().filter(|r| self.matches(r)).collect()
    }
}

fn non_blank(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

/// Draft/applied search state. Nothing is filtered until the first search.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub draft: FilterDraft,
    applied: Option<RunFilter>,
    tag_match: TagMatch,
}

impl SearchState {
    pub fn new(tag_match: TagMatch) -> Self {
        Self {
            tag_match,
            ..Default::default()
        }
    }

    pub fn search(&mut self) {
        self.applied = Some(RunFilter::from_draft(&self.draft, self.tag_match));
    }

    pub fn clear(&mut self) {
        self.draft = FilterDraft::default();
        self.applied = None;
    }

    pub fn is_active(&self) -> bool {
        self.applied.is_some()
    }

    pub fn applied(&self) -> Option<&RunFilter> {
        self.applied.as_ref()
    }

    pub fn apply<'a>(&self, runs: &'a [Run]) -> Vec<&'a Run> {
        match &self.applied {
            Some(f) => f.apply(runs),
            None => runs.iter().collect(),
        }
    }
}

/// Picker values for the filter form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub model_names: Vec<String>,
    pub tag_labels: Vec<String>,
}

impl FilterOptions {
    pub fn from_runs(runs: &[Run], tag_match: TagMatch) -> Self {
        let mut model_names: Vec<String> = runs.iter().map(|r| r.model_name.clone()).collect();
        model_names.sort();
        model_names.dedup();

        let mut tag_labels: Vec<String> = runs
            .iter()
            .flat_map(|r| r.tags.iter())
            .filter(|t| tag_match.accepts(t))
            .map(|t| t.label.clone())
            .collect();
        tag_labels.sort();
        tag_labels.dedup();

        Self {
            model_names,
            tag_labels,
        }
    }
}
