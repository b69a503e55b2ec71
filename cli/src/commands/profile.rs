use super::read_json;
use crate::output;
use ::config::Config;
use anyhow::{Context, Result, bail};
use aura_core::{ProfileStore, UserProfile};
use clap::Subcommand;
use std::path::PathBuf;
use storage::SqliteProfileStore;

#[derive(Subcommand)]
pub enum ProfileCommand {
    #[command(about = "Store a profile JSON file in the identity database")]
    Save {
        #[arg(help = "User profile JSON")]
        file: PathBuf
    },

    #[command(about = "Print a stored profile")]
    Load {
        #[arg(help = "Profile identifier")]
        aura_id: String
    }
}

async fn open(config: &Config) -> Result<SqliteProfileStore> {
    SqliteProfileStore::connect(&config.storage.database_url)
        .await
        .with_context(|| format!("Could not open {}", config.storage.database_url))
}

pub async fn run(cmd: ProfileCommand, config: &Config) -> Result<()> {
    match cmd {
        ProfileCommand::Save { file } => {
            let profile: UserProfile = read_json(&file)?;
            open(config).await?.save(&profile).await?;
            output::success(&format!("Saved profile {}", profile.aura_id));
            Ok(())
        }
        ProfileCommand::Load { aura_id } => match open(config).await?.load(&aura_id).await? {
            Some(profile) => output::json(&profile),
            None => bail!("No profile stored for {aura_id}")
        }
    }
}
