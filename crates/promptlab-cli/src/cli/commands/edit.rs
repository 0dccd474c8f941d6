use super::{exit_codes, Context};
use crate::cli::args::{NotesArgs, RunRefArgs, ScoreArgs, TagArgs, TagSub};
use promptlab_core::model::TAG_UNSELECTED;
use promptlab_core::repository::RunCommand;

fn apply(ctx: &Context, target: &RunRefArgs, cmd: RunCommand) -> anyhow::Result<i32> {
    let run = ctx.resolve_run(target)?;
    match ctx.repo.update_run(&run.id, cmd)? {
        Some(updated) => eprintln!("updated {}", updated.label()),
        None => eprintln!("note: {} no longer exists", run.label()),
    }
    Ok(exit_codes::OK)
}

pub fn score(ctx: &Context, args: ScoreArgs) -> anyhow::Result<i32> {
    apply(ctx, &args.target, RunCommand::SetScore(args.score))
}

pub fn tag(ctx: &Context, args: TagArgs) -> anyhow::Result<i32> {
    match args.cmd {
        TagSub::Add { target, label } => apply(ctx, &target, RunCommand::AddTag(label)),
        TagSub::Set {
            target,
            label,
            weight,
        } => apply(ctx, &target, RunCommand::SetTagWeight { label, weight }),
        TagSub::Clear { target, label } => apply(
            ctx,
            &target,
            RunCommand::SetTagWeight {
                label,
                weight: TAG_UNSELECTED,
            },
        ),
    }
}

pub fn notes(ctx: &Context, args: NotesArgs) -> anyhow::Result<i32> {
    apply(ctx, &args.target, RunCommand::SetNotes(args.notes))
}

pub fn delete(ctx: &Context, args: RunRefArgs) -> anyhow::Result<i32> {
    let run = ctx.resolve_run(&args)?;
    if ctx.repo.delete_run(&run.id)? {
        eprintln!("deleted {}", run.label());
    }
    Ok(exit_codes::OK)
}

/// Copies a run's parameters into the session so the next submit reuses them.
pub fn reuse(ctx: &Context, args: RunRefArgs) -> anyhow::Result<i32> {
    let run = ctx.resolve_run(&args)?;
    let store = ctx.repo.store();
    let mut prefs = store.load_session();
    prefs.active_experiment_id = Some(run.experiment_id.clone());
    prefs.model = Some(run.model_name.clone());
    if run.temperature.is_some() {
        prefs.temperature = run.temperature;
    }
    if run.tokens.is_some() {
        prefs.max_tokens = run.tokens;
    }
    store.save_session(&prefs)?;

    eprintln!("reusing parameters of {}", run.label());
    println!("{}", run.prompt);
    Ok(exit_codes::OK)
}
