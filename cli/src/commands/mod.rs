pub mod config;
pub mod distill;
pub mod explain;
pub mod process;
pub mod profile;
pub mod verify;

use ::config::ProviderKind;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "aura",
    author,
    version,
    about = "Aura - adaptive accessibility for the web",
    long_about = "Runs the Aura inference pipeline over captured pages.\n\nPages and profiles are \
                  read from JSON files; results are printed as pretty JSON.\nConfiguration comes \
                  from defaults, an optional file, AURA_* / provider env vars and flags."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands
}

#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    #[arg(long, global = true, help = "Configuration file (.toml, .yaml or .yml)")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Capability provider: ollama, gemini, openai or mock"
    )]
    pub provider: Option<ProviderKind>
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the adaptation pipeline over a page")]
    Process(process::ProcessArgs),

    #[command(about = "Distill a page into its summary and action lists")]
    Distill(distill::DistillArgs),

    #[command(about = "Explain a page in plain language")]
    Explain(explain::ExplainArgs),

    #[command(about = "Check an applied adaptation against a screenshot")]
    Verify(verify::VerifyArgs),

    #[command(subcommand, about = "Save and load user profiles")]
    Profile(profile::ProfileCommand),

    #[command(subcommand, about = "Inspect the effective configuration")]
    Config(config::ConfigCommand)
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON for this command", path.display()))
}
