use super::{exit_codes, print_json, Context};
use crate::cli::args::SubmitArgs;
use promptlab_core::errors::ConfigError;
use promptlab_core::model::RunStatus;
use promptlab_core::providers::{build_client, ProviderKind};
use promptlab_core::report::console;
use promptlab_core::submit::{SubmitRequest, Submitter};

pub async fn run(ctx: &Context, args: SubmitArgs) -> anyhow::Result<i32> {
    if args.prompt.trim().is_empty() {
        eprintln!("note: empty prompt, nothing sent");
        return Ok(exit_codes::OK);
    }
    let prefs = ctx.repo.store().load_session();
    let defaults = &ctx.cfg.defaults;

    // flags, then session preferences, then config defaults
    let model = args
        .model
        .or(prefs.model)
        .unwrap_or_else(|| defaults.model.clone());
    ctx.check_model(&model);

    let system_prompt = args
        .system
        .or(prefs.system_prompt)
        .or_else(|| Some(defaults.system_prompt.clone()))
        .filter(|s| !s.trim().is_empty());

    let mut req = SubmitRequest {
        experiment_id: String::new(),
        model,
        prompt: args.prompt,
        system_prompt,
        temperature: args
            .temperature
            .or(prefs.temperature)
            .unwrap_or(defaults.temperature),
        max_tokens: args
            .max_tokens
            .or(prefs.max_tokens)
            .unwrap_or(defaults.max_tokens),
    };
    // nothing may be written, not even a first experiment, for a bad request
    req.validate()?;
    let exp = ctx.experiment_or_create(args.experiment.as_deref())?;
    req.experiment_id = exp.id.clone();

    let mut inference = ctx.cfg.inference.clone();
    if let Some(p) = &args.provider {
        inference.provider = ProviderKind::parse(p)
            .ok_or_else(|| ConfigError(format!("unknown provider '{}'", p)))?;
        if args.base_url.is_none() && ctx.cfg.inference.provider != inference.provider {
            inference.base_url = None;
        }
    }
    if let Some(url) = args.base_url {
        inference.base_url = Some(url);
    }

    let client = build_client(inference.provider, inference.url());
    tracing::debug!(
        event = "submit.start",
        provider = client.provider_name(),
        url = inference.url(),
        experiment = %exp.name
    );
    let submitter = Submitter::new(ctx.repo.clone(), client);

    let Some(run) = submitter.submit(req).await? else {
        eprintln!("note: the pending run was deleted before the response arrived");
        return Ok(exit_codes::OK);
    };

    if args.format.is_json() {
        print_json(&run)?;
    } else {
        println!("{}", console::run_card(&run));
    }

    if run.status == RunStatus::Error {
        return Ok(exit_codes::RUN_FAILED);
    }
    Ok(exit_codes::OK)
}
