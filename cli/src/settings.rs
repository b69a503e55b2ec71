use crate::commands::GlobalArgs;
use anyhow::{Context, Result, anyhow};
use aura_core::CapabilityProvider;
use config::{Config, load_from_env, load_from_file, merge_configs, validate};
use pipeline::AuraRuntime;
use std::sync::Arc;

/// Effective configuration: defaults < file < environment < flags.
pub fn load(global: &GlobalArgs) -> Result<Config> {
    let from_file = match &global.config {
        Some(path) => load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default()
    };
    let from_env = load_from_env().map_err(|e| anyhow!("Invalid environment configuration: {e}"))?;

    let mut config = merge_configs(
        Config::default(),
        from_file,
        "file",
        from_env,
        "env",
        None,
        "cli"
    );
    if let Some(kind) = global.provider {
        config.provider.kind = kind;
    }

    validate(&config).context("Configuration is invalid")?;
    Ok(config)
}

pub fn provider(config: &Config) -> Result<Arc<dyn CapabilityProvider>> {
    providers::create_provider(&config.provider)
        .with_context(|| format!("Could not start the {} provider", config.provider.kind))
}

pub fn runtime(config: &Config) -> Result<AuraRuntime> {
    Ok(AuraRuntime::new(provider(config)?, config))
}
