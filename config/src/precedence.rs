//! # Configuration Precedence
//!
//! Merges configuration from multiple sources with precedence rules.
//!
//! # Precedence Order
//! 1. CLI arguments (highest priority)
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values (lowest priority)
//!
//! A source only overrides a field when it carries a non-default value, so
//! an unset environment variable never masks a value from the file.

use crate::config::{
    CacheConfig, Config, LlmConfig, ObservabilityConfig, PipelineConfig, StorageConfig
};
use std::fmt::Display;

/// Merge multiple configuration sources with precedence.
///
/// # M-CANONICAL-DOCS
///
/// ## Usage
/// ```rust,no_run
/// use config::{Config, merge_configs, load_from_file, load_from_env};
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let defaults = Config::default();
///     let from_file = load_from_file(Path::new("aura.toml"))?;
///     let from_env = load_from_env()?;
///
///     let _config = merge_configs(defaults, from_file, "file", from_env, "env", None, "cli");
///     Ok(())
/// }
/// ```
///
/// ## Deep Merge
/// Every nested section is merged field by field. Secrets are logged masked.
pub fn merge_configs(
    defaults: Config,
    file_config: Config,
    file_source_name: &str,
    env_config: Config,
    env_source_name: &str,
    cli_config: Option<Config>,
    cli_source_name: &str
) -> Config {
    let mut config = defaults;

    config = merge_with_logging(config, file_config, file_source_name);
    config = merge_with_logging(config, env_config, env_source_name);

    if let Some(cli) = cli_config {
        config = merge_with_logging(config, cli, cli_source_name);
    }

    config
}

fn merge_with_logging(mut base: Config, override_config: Config, source_name: &str) -> Config {
    let mut changes = Vec::new();

    merge_provider(&mut base.provider, &override_config.provider, &mut changes);
    merge_pipeline(&mut base.pipeline, &override_config.pipeline, &mut changes);
    merge_cache(&mut base.cache, &override_config.cache, &mut changes);
    merge_storage(&mut base.storage, &override_config.storage, &mut changes);
    merge_observability(
        &mut base.observability,
        &override_config.observability,
        &mut changes
    );

    if !changes.is_empty() {
        tracing::debug!("Configuration from {}: {:?}", source_name, changes);
    }

    base
}

/// Applies `candidate` when it differs from both the default and the current
/// value.
fn apply<T: PartialEq + Clone + Display>(
    field: &str,
    base: &mut T,
    candidate: &T,
    default: &T,
    changes: &mut Vec<String>
) {
    if candidate != default && candidate != base {
        changes.push(format!("{field} = {candidate}"));
        base.clone_from(candidate);
    }
}

fn apply_secret(
    field: &str,
    base: &mut Option<String>,
    candidate: &Option<String>,
    changes: &mut Vec<String>
) {
    if candidate.is_some() && candidate != base {
        changes.push(format!("{field} = ***"));
        base.clone_from(candidate);
    }
}

fn apply_optional(
    field: &str,
    base: &mut Option<String>,
    candidate: &Option<String>,
    changes: &mut Vec<String>
) {
    if let Some(value) = candidate {
        if candidate != base {
            changes.push(format!("{field} = {value}"));
            base.clone_from(candidate);
        }
    }
}

fn merge_provider(base: &mut LlmConfig, other: &LlmConfig, changes: &mut Vec<String>) {
    let d = LlmConfig::default();
    apply("provider.kind", &mut base.kind, &other.kind, &d.kind, changes);
    apply(
        "provider.timeout_seconds",
        &mut base.timeout_seconds,
        &other.timeout_seconds,
        &d.timeout_seconds,
        changes
    );
    apply(
        "provider.ollama.host",
        &mut base.ollama.host,
        &other.ollama.host,
        &d.ollama.host,
        changes
    );
    apply(
        "provider.ollama.model",
        &mut base.ollama.model,
        &other.ollama.model,
        &d.ollama.model,
        changes
    );
    apply_secret(
        "provider.gemini.api_key",
        &mut base.gemini.api_key,
        &other.gemini.api_key,
        changes
    );
    apply(
        "provider.gemini.model",
        &mut base.gemini.model,
        &other.gemini.model,
        &d.gemini.model,
        changes
    );
    apply(
        "provider.gemini.vision_model",
        &mut base.gemini.vision_model,
        &other.gemini.vision_model,
        &d.gemini.vision_model,
        changes
    );
    apply(
        "provider.gemini.base_url",
        &mut base.gemini.base_url,
        &other.gemini.base_url,
        &d.gemini.base_url,
        changes
    );
    apply_secret(
        "provider.openai.api_key",
        &mut base.openai.api_key,
        &other.openai.api_key,
        changes
    );
    apply(
        "provider.openai.model",
        &mut base.openai.model,
        &other.openai.model,
        &d.openai.model,
        changes
    );
    apply_optional(
        "provider.openai.base_url",
        &mut base.openai.base_url,
        &other.openai.base_url,
        changes
    );
}

fn merge_pipeline(base: &mut PipelineConfig, other: &PipelineConfig, changes: &mut Vec<String>) {
    let d = PipelineConfig::default();
    apply(
        "pipeline.max_elements",
        &mut base.max_elements,
        &other.max_elements,
        &d.max_elements,
        changes
    );
    apply(
        "pipeline.assessment_confidence_threshold",
        &mut base.assessment_confidence_threshold,
        &other.assessment_confidence_threshold,
        &d.assessment_confidence_threshold,
        changes
    );
    apply(
        "pipeline.adaptation_confidence_threshold",
        &mut base.adaptation_confidence_threshold,
        &other.adaptation_confidence_threshold,
        &d.adaptation_confidence_threshold,
        changes
    );
    apply(
        "pipeline.visual_complexity_threshold",
        &mut base.visual_complexity_threshold,
        &other.visual_complexity_threshold,
        &d.visual_complexity_threshold,
        changes
    );
    apply(
        "pipeline.visual_confidence_threshold",
        &mut base.visual_confidence_threshold,
        &other.visual_confidence_threshold,
        &d.visual_confidence_threshold,
        changes
    );
    apply(
        "pipeline.phase_retries",
        &mut base.phase_retries,
        &other.phase_retries,
        &d.phase_retries,
        changes
    );
    apply(
        "pipeline.vision_retries",
        &mut base.vision_retries,
        &other.vision_retries,
        &d.vision_retries,
        changes
    );
    apply(
        "pipeline.heuristics.idle_time_seconds",
        &mut base.heuristics.idle_time_seconds,
        &other.heuristics.idle_time_seconds,
        &d.heuristics.idle_time_seconds,
        changes
    );
    apply(
        "pipeline.heuristics.structure_chars",
        &mut base.heuristics.structure_chars,
        &other.heuristics.structure_chars,
        &d.heuristics.structure_chars,
        changes
    );
    apply(
        "pipeline.fallback_hide_count",
        &mut base.fallback_hide_count,
        &other.fallback_hide_count,
        &d.fallback_hide_count,
        changes
    );
}

fn merge_cache(base: &mut CacheConfig, other: &CacheConfig, changes: &mut Vec<String>) {
    let d = CacheConfig::default();
    apply("cache.enabled", &mut base.enabled, &other.enabled, &d.enabled, changes);
    apply(
        "cache.pipeline_ttl_seconds",
        &mut base.pipeline_ttl_seconds,
        &other.pipeline_ttl_seconds,
        &d.pipeline_ttl_seconds,
        changes
    );
    apply(
        "cache.explanation_ttl_seconds",
        &mut base.explanation_ttl_seconds,
        &other.explanation_ttl_seconds,
        &d.explanation_ttl_seconds,
        changes
    );
    apply(
        "cache.max_entries",
        &mut base.max_entries,
        &other.max_entries,
        &d.max_entries,
        changes
    );
}

fn merge_storage(base: &mut StorageConfig, other: &StorageConfig, changes: &mut Vec<String>) {
    let d = StorageConfig::default();
    apply(
        "storage.database_url",
        &mut base.database_url,
        &other.database_url,
        &d.database_url,
        changes
    );
}

fn merge_observability(
    base: &mut ObservabilityConfig,
    other: &ObservabilityConfig,
    changes: &mut Vec<String>
) {
    let d = ObservabilityConfig::default();
    apply(
        "observability.logging_level",
        &mut base.logging_level,
        &other.logging_level,
        &d.logging_level,
        changes
    );
    apply(
        "observability.metrics_enabled",
        &mut base.metrics_enabled,
        &other.metrics_enabled,
        &d.metrics_enabled,
        changes
    );
}
