use super::read_json;
use crate::{output, settings};
use ::config::Config;
use anyhow::Result;
use aura_core::{DomData, UserProfile};
use clap::Args;
use futures_util::StreamExt;
use pipeline::{ChunkKind, distill};
use std::path::PathBuf;

#[derive(Args)]
pub struct ExplainArgs {
    #[arg(long, help = "Page capture as DomData JSON")]
    pub dom: PathBuf,

    #[arg(long, help = "User profile JSON; tailors the language level")]
    pub profile: Option<PathBuf>,

    #[arg(long, help = "Print summary and action chunks as they arrive")]
    pub stream: bool,

    #[arg(long, help = "Find the page action matching this request instead")]
    pub find: Option<String>
}

pub async fn run(args: ExplainArgs, config: &Config) -> Result<()> {
    let page: DomData = read_json(&args.dom)?;
    let profile: Option<UserProfile> = args
        .profile
        .as_deref()
        .map(read_json::<UserProfile>)
        .transpose()?;
    let runtime = settings::runtime(config)?;
    let distilled = distill(&page, config.pipeline.max_elements);

    if let Some(query) = &args.find {
        let found = runtime.explainer.find_action(&distilled, query).await?;
        if found.is_none() {
            output::info("No matching action on this page");
        }
        return output::json(&found);
    }

    if args.stream {
        let mut chunks = runtime
            .explainer
            .stream_explanation(&distilled, profile.as_ref())
            .await;
        while let Some(chunk) = chunks.next().await {
            if chunk.kind == ChunkKind::Error {
                output::warn(&chunk.content);
            }
            output::json_line(&chunk)?;
        }
        return Ok(());
    }

    let explained = runtime
        .explainer
        .explain_page(&distilled, profile.as_ref())
        .await?;
    output::json(&explained.explanation)
}
