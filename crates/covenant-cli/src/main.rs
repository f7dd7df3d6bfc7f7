//! Covenant CLI - Entry point

use std::io;

use anyhow::Result;
use clap::Parser;

use covenant::telemetry::init_logging;
use covenant_cli::{load_config, run, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging.to_log_config())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(cli.command, &config, &mut out)
}
