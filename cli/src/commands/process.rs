use super::read_json;
use crate::{output, settings};
use ::config::Config;
use anyhow::Result;
use aura_core::{DomData, UserProfile};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct ProcessArgs {
    #[arg(long, help = "Page capture as DomData JSON")]
    pub dom: PathBuf,

    #[arg(long, help = "User profile JSON")]
    pub profile: PathBuf,

    #[arg(long, help = "Treat as an explicit user request (skips the heuristic gate)")]
    pub explicit: bool,

    #[arg(long = "log", value_name = "ENTRY", help = "Interaction log entry (repeatable)")]
    pub logs: Vec<String>,

    #[arg(long, help = "Record the exchange in this conversation session")]
    pub session: Option<String>
}

pub async fn run(args: ProcessArgs, config: &Config) -> Result<()> {
    let page: DomData = read_json(&args.dom)?;
    let profile: UserProfile = read_json(&args.profile)?;
    let runtime = settings::runtime(config)?;

    let result = match &args.session {
        Some(session_id) => {
            runtime
                .process_in_session(session_id, &page, &profile, &args.logs, args.explicit)
                .await
        }
        None => {
            runtime
                .process_page(&page, &profile, &args.logs, args.explicit)
                .await
        }
    };

    output::json(&result)
}
