use crate::output;
use ::config::Config;
use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Print the effective configuration with secrets masked")]
    Show
}

const MASK: &str = "***";

fn masked(config: &Config) -> Config {
    let mut shown = config.clone();
    for key in [
        &mut shown.provider.gemini.api_key,
        &mut shown.provider.openai.api_key
    ] {
        if key.is_some() {
            *key = Some(MASK.to_string());
        }
    }
    shown
}

pub fn run(cmd: ConfigCommand, config: &Config) -> Result<()> {
    match cmd {
        ConfigCommand::Show => output::json(&masked(config))
    }
}
