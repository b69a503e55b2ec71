use crate::{output, settings};
use ::config::Config;
use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::Args;
use pipeline::VerificationRequest;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct VerifyArgs {
    #[arg(long, help = "Address of the adapted page")]
    pub url: String,

    #[arg(long, help = "What the user is trying to do on the page")]
    pub goal: String,

    #[arg(long = "action", value_name = "ACTION", help = "Applied adaptation (repeatable)")]
    pub actions: Vec<String>,

    #[arg(long, help = "Screenshot of the adapted page (png, jpeg, webp)")]
    pub screenshot: Option<PathBuf>
}

fn screenshot_data_url(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read screenshot {}", path.display()))?;
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "image/png"
    };
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

pub async fn run(args: VerifyArgs, config: &Config) -> Result<()> {
    let screenshot = args
        .screenshot
        .as_deref()
        .map(screenshot_data_url)
        .transpose()?;
    if screenshot.is_none() {
        output::warn("No screenshot given; the adaptation cannot be verified");
    }

    let runtime = settings::runtime(config)?;
    let verdict = runtime
        .verify_adaptation(&VerificationRequest {
            url: args.url,
            goal: args.goal,
            actions_applied: args.actions,
            screenshot
        })
        .await;

    output::json(&verdict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screenshot_mime_follows_extension() {
        let dir = tempfile::tempdir().unwrap();
        let jpeg = dir.path().join("shot.JPG");
        std::fs::write(&jpeg, [0xff, 0xd8]).unwrap();
        let png = dir.path().join("shot.bin");
        std::fs::write(&png, [0x89]).unwrap();

        assert_eq!(screenshot_data_url(&jpeg).unwrap(), "data:image/jpeg;base64,/9g=");
        assert!(screenshot_data_url(&png).unwrap().starts_with("data:image/png;base64,"));
    }
}
