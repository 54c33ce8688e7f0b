mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("sigoff={}", level).parse()?)
                .add_directive(format!("sigoff_core={}", level).parse()?),
        )
        .init();

    match cli.command {
        Command::Update(args) => commands::update::run(args, &cli.config),
        Command::Scan(args) => commands::scan::run(args, &cli.config),
    }
}
