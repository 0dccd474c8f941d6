use super::{exit_codes, print_json, Context};
use crate::cli::args::CompareArgs;
use promptlab_core::compare::RunPicker;
use promptlab_core::errors::ConfigError;
use promptlab_core::report::console;

pub fn run(ctx: &Context, args: CompareArgs) -> anyhow::Result<i32> {
    let exp = ctx.experiment(args.experiment.as_deref())?;
    let runs = ctx.repo.list_runs(&exp.id);

    let pick = |n: Option<u32>| -> anyhow::Result<Option<String>> {
        match n {
            None => Ok(None),
            Some(n) => RunPicker::select_by_number(&runs, n)
                .map(Some)
                .ok_or_else(|| ConfigError(format!("run not found: #Run{}", n)).into()),
        }
    };
    let picker = RunPicker {
        left: pick(args.left)?,
        right: pick(args.right)?,
    }
    .reconcile(&runs);

    let (Some(left), Some(right)) = picker.resolve(&runs) else {
        eprintln!("note: no runs to compare in '{}'", exp.name);
        return Ok(exit_codes::OK);
    };
    let summary = picker.summary(&runs);

    if args.format.is_json() {
        print_json(&serde_json::json!({
            "left": left,
            "right": right,
            "summary": summary,
            "options": RunPicker::options(&runs),
        }))?;
    } else {
        println!("{}", console::comparison(left, right, &summary));
    }
    Ok(exit_codes::OK)
}
