mod cli;
mod commands;
mod config;
mod platform;

use anyhow::Result;
use clap::Parser;
use narrator_logging::narrator_debug;

use cli::Cli;
use config::NarratorConfig;
use platform::logging::{self, LogDestination};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let file_config = NarratorConfig::load(cli.config.as_deref())?;
    let resolved = file_config.resolve(&cli);

    logging::initialize(resolved.log_level, LogDestination::from_flag(cli.log_file));
    narrator_debug!(
        "Backend {} output {}",
        resolved.settings.base_url,
        resolved.settings.output_dir.display()
    );

    commands::run(cli.command, &resolved)
}
