use super::{exit_codes, print_json, Context};
use crate::cli::args::RunsArgs;
use promptlab_core::filter::{FilterDraft, FilterOptions, SearchState, TagMatch};
use promptlab_core::report::console;

pub fn run(ctx: &Context, args: RunsArgs) -> anyhow::Result<i32> {
    let exp = ctx.experiment(args.experiment.as_deref())?;
    let runs = ctx.repo.list_runs(&exp.id);

    let tag_match = if args.weighted_tags {
        TagMatch::Weighted
    } else {
        ctx.cfg.filter.tag_match
    };

    if args.options {
        let opts = FilterOptions::from_runs(&runs, tag_match);
        if args.format.is_json() {
            print_json(&opts)?;
        } else {
            println!("models: {}", opts.model_names.join(", "));
            println!("tags:   {}", opts.tag_labels.join(", "));
        }
        return Ok(exit_codes::OK);
    }

    let mut search = SearchState::new(tag_match);
    search.draft = FilterDraft {
        model: args.model.unwrap_or_default(),
        tag: args.tag.unwrap_or_default(),
        score_min: args.score_min.unwrap_or_default(),
        score_max: args.score_max.unwrap_or_default(),
        temp_min: args.temp_min.unwrap_or_default(),
        temp_max: args.temp_max.unwrap_or_default(),
        tokens_min: args.tokens_min.unwrap_or_default(),
        tokens_max: args.tokens_max.unwrap_or_default(),
    };
    if search.draft != FilterDraft::default() {
        search.search();
    }

    let shown = search.apply(&runs);
    if args.format.is_json() {
        print_json(&shown)?;
    } else {
        println!("{}", console::run_list(&shown));
        if search.is_active() {
            eprintln!("{} of {} runs match", shown.len(), runs.len());
        }
    }
    Ok(exit_codes::OK)
}
