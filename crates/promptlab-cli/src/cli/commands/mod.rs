use super::args::*;
use promptlab_core::config::{load_or_default, LabConfig};
use promptlab_core::errors::ConfigError;
use promptlab_core::model::{Experiment, Run};
use promptlab_core::repository::Repository;
use promptlab_core::storage::{open_backend, BackendKind};

pub mod compare;
pub mod edit;
pub mod experiment;
pub mod init;
pub mod prefs;
pub mod runs;
pub mod submit;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const RUN_FAILED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    if let Command::Version = cli.cmd {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(exit_codes::OK);
    }
    if let Command::Init(args) = &cli.cmd {
        return init::run(&cli.config, args);
    }

    let ctx = Context::open(&cli)?;
    match cli.cmd {
        Command::Experiment(args) => experiment::run(&ctx, args),
        Command::Submit(args) => submit::run(&ctx, args).await,
        Command::Runs(args) => runs::run(&ctx, args),
        Command::Score(args) => edit::score(&ctx, args),
        Command::Tag(args) => edit::tag(&ctx, args),
        Command::Notes(args) => edit::notes(&ctx, args),
        Command::Delete(args) => edit::delete(&ctx, args),
        Command::Reuse(args) => edit::reuse(&ctx, args),
        Command::Compare(args) => compare::run(&ctx, args),
        Command::Models(args) => prefs::models(&ctx, args),
        Command::Prefs(args) => prefs::run(&ctx, args),
        Command::Init(_) | Command::Version => Ok(exit_codes::OK),
    }
}

/// Loaded config plus an open repository for one invocation.
pub struct Context {
    pub cfg: LabConfig,
    pub repo: Repository,
}

impl Context {
    fn open(cli: &Cli) -> anyhow::Result<Self> {
        let mut cfg = load_or_default(&cli.config, cli.strict)?;
        cfg.apply_env(|k| std::env::var(k).ok())?;

        if let Some(s) = &cli.store {
            cfg.store.backend = BackendKind::parse(s)
                .ok_or_else(|| ConfigError(format!("unknown store backend '{}'", s)))?;
        }
        if let Some(db) = &cli.db {
            cfg.store.path = db.clone();
        }

        let backend = open_backend(cfg.store.backend, &cfg.store.path)?;
        Ok(Self {
            cfg,
            repo: Repository::new(backend),
        })
    }

    /// `--experiment`, then the session's active experiment, then the newest one.
    pub fn experiment(&self, selector: Option<&str>) -> anyhow::Result<Experiment> {
        if let Some(sel) = selector {
            return self
                .repo
                .find_experiment(sel)
                .ok_or_else(|| ConfigError(format!("experiment not found: {}", sel)).into());
        }
        let prefs = self.repo.store().load_session();
        if let Some(e) = prefs
            .active_experiment_id
            .as_deref()
            .and_then(|id| self.repo.find_experiment(id))
        {
            return Ok(e);
        }
        self.repo.list_experiments().into_iter().next().ok_or_else(|| {
            ConfigError("no experiments yet (run `promptlab experiment new`)".into()).into()
        })
    }

    /// Like [`Context::experiment`], but creates one when the store is empty.
    pub fn experiment_or_create(&self, selector: Option<&str>) -> anyhow::Result<Experiment> {
        if selector.is_none() && self.repo.list_experiments().is_empty() {
            let exp = self.repo.create_experiment(None)?;
            self.set_active(&exp.id)?;
            return Ok(exp);
        }
        self.experiment(selector)
    }

    pub fn set_active(&self, experiment_id: &str) -> anyhow::Result<()> {
        let store = self.repo.store();
        let mut prefs = store.load_session();
        prefs.active_experiment_id = Some(experiment_id.to_string());
        store.save_session(&prefs)
    }

    pub fn resolve_run(&self, target: &RunRefArgs) -> anyhow::Result<Run> {
        let exp = self.experiment(target.experiment.as_deref())?;
        let runs = self.repo.list_runs(&exp.id);
        let key = target.run.trim();
        let number = key
            .strip_prefix("#Run")
            .or_else(|| key.strip_prefix('#'))
            .unwrap_or(key)
            .parse::<u32>()
            .ok();

        // run numbers can repeat after a delete; the newest wins
        let found = match number {
            Some(n) => runs.iter().rev().find(|r| r.run_number == n),
            None => runs.iter().find(|r| r.id == key),
        };
        found
            .cloned()
            .ok_or_else(|| ConfigError(format!("run not found in '{}': {}", exp.name, key)).into())
    }

    /// Warns about model names that are not in the catalog.
    pub fn check_model(&self, name: &str) {
        if self.cfg.knows_model(name) {
            return;
        }
        match self.cfg.suggest_model(name) {
            Some(s) => eprintln!("warning: unknown model '{}' (did you mean '{}'?)", name, s),
            None => eprintln!("warning: unknown model '{}'", name),
        }
    }
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", promptlab_core::report::json::to_pretty(value)?);
    Ok(())
}
