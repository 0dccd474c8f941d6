use super::exit_codes;
use crate::cli::args::InitArgs;
use std::path::Path;

pub fn run(config: &Path, args: &InitArgs) -> anyhow::Result<i32> {
    if !config.exists() {
        if let Some(parent) = config.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        promptlab_core::config::write_sample_config(config)?;
        eprintln!("created {}", config.display());
    } else {
        eprintln!("note: {} already exists", config.display());
    }

    if args.gitignore {
        let dir = config
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let gi_path = dir.join(".gitignore");
        if !gi_path.exists() {
            std::fs::write(&gi_path, crate::templates::GITIGNORE)?;
            eprintln!("created {}", gi_path.display());
        } else {
            eprintln!("note: {} already exists (skipped)", gi_path.display());
        }
    }

    Ok(exit_codes::OK)
}
