use super::{exit_codes, print_json, Context};
use crate::cli::args::{ExperimentArgs, ExperimentSub};
use promptlab_core::errors::ConfigError;
use promptlab_core::report::console;

pub fn run(ctx: &Context, args: ExperimentArgs) -> anyhow::Result<i32> {
    match args.cmd {
        ExperimentSub::New { name } => {
            let exp = ctx.repo.create_experiment(name.as_deref())?;
            ctx.set_active(&exp.id)?;
            eprintln!("created experiment: {}", exp.name);
            println!("{}", exp.id);
        }
        ExperimentSub::Rename { experiment, name } => {
            let exp = ctx
                .repo
                .find_experiment(&experiment)
                .ok_or_else(|| ConfigError(format!("experiment not found: {}", experiment)))?;
            ctx.repo.rename_experiment(&exp.id, &name)?;
            eprintln!("renamed experiment: {} -> {}", exp.name, name);
        }
        ExperimentSub::List { format, overview } => {
            let active = ctx.repo.store().load_session().active_experiment_id;
            if overview {
                let items = ctx.repo.experiment_overview();
                if format.is_json() {
                    print_json(&items)?;
                } else {
                    println!("{}", console::overview(&items));
                }
            } else {
                let items = ctx.repo.list_experiments();
                if format.is_json() {
                    print_json(&items)?;
                } else {
                    println!("{}", console::experiment_list(&items, active.as_deref()));
                }
            }
        }
        ExperimentSub::Show { experiment, format } => {
            let exp = ctx.experiment(experiment.as_deref())?;
            let stats = ctx.repo.experiment_stats(&exp.id);
            let runs = ctx.repo.list_runs(&exp.id);
            if format.is_json() {
                print_json(&serde_json::json!({
                    "experiment": exp,
                    "stats": stats,
                    "runs": runs,
                }))?;
            } else {
                println!("{}  ({})", exp.name, exp.id);
                println!("{}", console::stats(&stats));
                let refs: Vec<_> = runs.iter().collect();
                println!("{}", console::run_list(&refs));
            }
        }
        ExperimentSub::Use { experiment } => {
            let exp = ctx
                .repo
                .find_experiment(&experiment)
                .ok_or_else(|| ConfigError(format!("experiment not found: {}", experiment)))?;
            ctx.set_active(&exp.id)?;
            eprintln!("active experiment: {}", exp.name);
        }
    }
    Ok(exit_codes::OK)
}
