use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;
mod settings;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = settings::load(&cli.global)?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.observability.logging_level))
        )
        .init();

    match cli.command {
        Commands::Process(args) => commands::process::run(args, &config).await,
        Commands::Distill(args) => commands::distill::run(args, &config),
        Commands::Explain(args) => commands::explain::run(args, &config).await,
        Commands::Verify(args) => commands::verify::run(args, &config).await,
        Commands::Profile(cmd) => commands::profile::run(cmd, &config).await,
        Commands::Config(cmd) => commands::config::run(cmd, &config)
    }
}
