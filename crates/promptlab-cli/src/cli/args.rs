use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "promptlab",
    version,
    about = "Local prompt experiment tracker for Ollama-compatible model servers"
)]
pub struct Cli {
    #[arg(long, global = true, default_value = "promptlab.yaml", env = "PROMPTLAB_CONFIG")]
    pub config: PathBuf,

    /// storage backend: sqlite|file|memory (overrides config and PROMPTLAB_STORE)
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// sqlite file or json directory (overrides config)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// reject unknown config keys
    #[arg(long, global = true)]
    pub strict: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a sample promptlab.yaml
    Init(InitArgs),
    Experiment(ExperimentArgs),
    /// Send a prompt and record the run
    Submit(SubmitArgs),
    /// List and filter runs of an experiment
    Runs(RunsArgs),
    Score(ScoreArgs),
    Tag(TagArgs),
    Notes(NotesArgs),
    Delete(RunRefArgs),
    /// Load a run's prompt and parameters into the session preferences
    Reuse(RunRefArgs),
    Compare(CompareArgs),
    /// Show the model catalog
    Models(FormatArgs),
    /// Show or change session preferences
    Prefs(PrefsArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct FormatArgs {
    #[arg(long, default_value = "text")]
    pub format: String, // text|json
}

impl FormatArgs {
    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

#[derive(Parser, Clone)]
pub struct InitArgs {
    /// generate .gitignore for the store
    #[arg(long)]
    pub gitignore: bool,
}

#[derive(Parser, Clone)]
pub struct ExperimentArgs {
    #[command(subcommand)]
    pub cmd: ExperimentSub,
}

#[derive(Subcommand, Clone)]
pub enum ExperimentSub {
    /// Create an experiment and make it active
    New {
        name: Option<String>,
    },
    Rename {
        /// experiment id or name
        experiment: String,
        name: String,
    },
    List {
        #[command(flatten)]
        format: FormatArgs,
        /// include previews of the latest runs
        #[arg(long)]
        overview: bool,
    },
    /// Stats and runs of one experiment (active by default)
    Show {
        experiment: Option<String>,
        #[command(flatten)]
        format: FormatArgs,
    },
    /// Make an experiment the active one
    Use {
        experiment: String,
    },
}

#[derive(Parser, Clone)]
pub struct SubmitArgs {
    pub prompt: String,

    /// experiment id or name (defaults to the active one)
    #[arg(long)]
    pub experiment: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub temperature: Option<f64>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// system prompt
    #[arg(long)]
    pub system: Option<String>,

    /// inference provider: ollama|proxy|fake
    #[arg(long)]
    pub provider: Option<String>,

    #[arg(long)]
    pub base_url: Option<String>,

    #[command(flatten)]
    pub format: FormatArgs,
}

#[derive(Parser, Clone)]
pub struct RunsArgs {
    #[arg(long)]
    pub experiment: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub tag: Option<String>,

    #[arg(long)]
    pub score_min: Option<String>,

    #[arg(long)]
    pub score_max: Option<String>,

    #[arg(long)]
    pub temp_min: Option<String>,

    #[arg(long)]
    pub temp_max: Option<String>,

    #[arg(long)]
    pub tokens_min: Option<String>,

    #[arg(long)]
    pub tokens_max: Option<String>,

    /// only count tags with a positive weight
    #[arg(long)]
    pub weighted_tags: bool,

    /// print the selectable model names and tag labels instead
    #[arg(long)]
    pub options: bool,

    #[command(flatten)]
    pub format: FormatArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunRefArgs {
    /// run number (e.g. 3 or #Run3) or run id
    pub run: String,

    #[arg(long)]
    pub experiment: Option<String>,
}

#[derive(Parser, Clone)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub target: RunRefArgs,

    /// 0..=10
    pub score: f64,
}

#[derive(Parser, Clone)]
pub struct TagArgs {
    #[command(subcommand)]
    pub cmd: TagSub,
}

#[derive(Subcommand, Clone)]
pub enum TagSub {
    /// Add a custom tag (selected, weight 0)
    Add {
        #[command(flatten)]
        target: RunRefArgs,
        label: String,
    },
    /// Select a tag with a weight (0..=9)
    Set {
        #[command(flatten)]
        target: RunRefArgs,
        label: String,
        #[arg(default_value_t = 0)]
        weight: i32,
    },
    /// Deselect a tag
    Clear {
        #[command(flatten)]
        target: RunRefArgs,
        label: String,
    },
}

#[derive(Parser, Clone)]
pub struct NotesArgs {
    #[command(flatten)]
    pub target: RunRefArgs,

    pub notes: String,
}

#[derive(Parser, Clone)]
pub struct CompareArgs {
    #[arg(long)]
    pub experiment: Option<String>,

    /// run number for the left side (default: most recent)
    #[arg(long)]
    pub left: Option<u32>,

    /// run number for the right side (default: second most recent)
    #[arg(long)]
    pub right: Option<u32>,

    #[command(flatten)]
    pub format: FormatArgs,
}

#[derive(Parser, Clone)]
pub struct PrefsArgs {
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub temperature: Option<f64>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    #[arg(long)]
    pub system: Option<String>,

    /// forget all session preferences
    #[arg(long)]
    pub clear: bool,

    #[command(flatten)]
    pub format: FormatArgs,
}
