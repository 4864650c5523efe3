mod app;
mod config;
mod customize;
mod engine;
mod grid;
mod host;
mod input;
mod palette;
mod render;
mod rules;
mod scheduler;

use anyhow::{Context, Result};
use clap::Parser;
use config::{init_logging_or_warn, load_settings, project_paths, save_settings_atomic, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    let paths = project_paths()?;
    init_logging_or_warn(&paths.log_path);

    let settings_path = args.config.clone().unwrap_or(paths.settings_path);
    let mut settings = load_settings(&settings_path);
    settings.apply_args(&args);
    settings.validate().context("invalid settings")?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }
    if args.write_config {
        save_settings_atomic(&settings_path, &settings)?;
        println!("wrote {}", settings_path.display());
        return Ok(());
    }

    log::info!("starting with {}", settings.rules.describe());
    app::run(settings)
}
