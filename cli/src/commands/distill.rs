use crate::output;
use ::config::Config;
use anyhow::{Context, Result, bail};
use clap::Args;
use pipeline::{distill_html, distill_value};
use std::path::PathBuf;

#[derive(Args)]
pub struct DistillArgs {
    #[arg(long, help = "Page capture as DomData JSON", conflicts_with = "html")]
    pub dom: Option<PathBuf>,

    #[arg(long, help = "Raw HTML document", requires = "url")]
    pub html: Option<PathBuf>,

    #[arg(long, help = "Address the HTML was fetched from")]
    pub url: Option<String>,

    #[arg(long, help = "Per-list element limit (defaults to pipeline.max_elements)")]
    pub max_elements: Option<usize>
}

pub fn run(args: DistillArgs, config: &Config) -> Result<()> {
    let max_elements = args
        .max_elements
        .unwrap_or(config.pipeline.max_elements);

    let distilled = match (&args.dom, &args.html) {
        (Some(dom), _) => {
            let raw = std::fs::read_to_string(dom)
                .with_context(|| format!("Failed to read {}", dom.display()))?;
            let value: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", dom.display()))?;
            distill_value(&value, max_elements)
        }
        (None, Some(html)) => {
            let raw = std::fs::read_to_string(html)
                .with_context(|| format!("Failed to read {}", html.display()))?;
            distill_html(&raw, args.url.as_deref().unwrap_or_default(), max_elements)
        }
        (None, None) => bail!("Provide either --dom <file> or --html <file> --url <url>")
    };

    output::json(&distilled)
}
