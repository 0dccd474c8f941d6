use super::{exit_codes, print_json, Context};
use crate::cli::args::{FormatArgs, PrefsArgs};
use promptlab_core::model::SessionPrefs;
use promptlab_core::report::console;

pub fn run(ctx: &Context, args: PrefsArgs) -> anyhow::Result<i32> {
    let store = ctx.repo.store();
    let mut prefs = if args.clear {
        SessionPrefs::default()
    } else {
        store.load_session()
    };

    if let Some(m) = args.model {
        ctx.check_model(&m);
        prefs.model = Some(m);
    }
    if args.temperature.is_some() {
        prefs.temperature = args.temperature;
    }
    if args.max_tokens.is_some() {
        prefs.max_tokens = args.max_tokens;
    }
    if args.system.is_some() {
        prefs.system_prompt = args.system;
    }
    store.save_session(&prefs)?;

    if args.format.is_json() {
        print_json(&prefs)?;
    } else {
        let d = &ctx.cfg.defaults;
        let model = prefs.model.as_deref().unwrap_or(&d.model);
        println!("model:         {}", model);
        println!("temperature:   {}", prefs.temperature.unwrap_or(d.temperature));
        println!("max tokens:    {}", prefs.max_tokens.unwrap_or(d.max_tokens));
        println!(
            "system prompt: {}",
            prefs.system_prompt.as_deref().unwrap_or(&d.system_prompt)
        );
    }
    Ok(exit_codes::OK)
}

pub fn models(ctx: &Context, args: FormatArgs) -> anyhow::Result<i32> {
    if args.is_json() {
        print_json(&ctx.cfg.models)?;
        return Ok(exit_codes::OK);
    }
    let current = ctx
        .repo
        .store()
        .load_session()
        .model
        .unwrap_or_else(|| ctx.cfg.defaults.model.clone());
    println!("{}", console::model_list(&ctx.cfg.models, &current));
    Ok(exit_codes::OK)
}
