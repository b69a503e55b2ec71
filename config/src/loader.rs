//! # Environment Variable Loader
//!
//! Loads configuration from environment variables following 12-factor app
//! principles.
//!
//! # Naming Convention
//! - Provider variables keep the names the provider ecosystems use
//!   (`LLM_PROVIDER`, `OLLAMA_*`, `GEMINI_*`, `OPENAI_*`)
//! - Everything else is prefixed with `AURA_`

use crate::config::{
    CacheConfig, Config, GeminiConfig, HeuristicsConfig, LlmConfig, ObservabilityConfig,
    OllamaConfig, OpenAiConfig, PipelineConfig, ProviderKind, StorageConfig
};
use errors::ConfigError;
use std::env;
use std::str::FromStr;

/// Load configuration from environment variables.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Loads configuration from environment variables. Environment variables
/// override file values but can be overridden by CLI arguments. Unset or
/// unparseable numeric values fall back to defaults.
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_env;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_from_env()?;
///     println!("Provider: {}", config.provider.kind);
///     Ok(())
/// }
/// ```
///
/// ## Environment Variables
/// ### Provider
/// - `LLM_PROVIDER`: ollama/gemini/openai/mock (default: ollama)
/// - `AURA_PROVIDER_TIMEOUT_SECONDS`: Per-call timeout (default: 60)
/// - `OLLAMA_HOST`, `OLLAMA_MODEL`
/// - `GEMINI_API_KEY` (or `GOOGLE_API_KEY`), `GEMINI_MODEL`,
///   `GEMINI_VISION_MODEL`, `GEMINI_BASE_URL`
/// - `OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_BASE_URL`
///
/// ### Pipeline
/// - `AURA_MAX_ELEMENTS` (default: 40)
/// - `AURA_ASSESSMENT_CONFIDENCE_THRESHOLD` (default: 0.5)
/// - `AURA_ADAPTATION_CONFIDENCE_THRESHOLD` (default: 0.6)
/// - `AURA_VISUAL_COMPLEXITY_THRESHOLD` (default: 7)
/// - `AURA_VISUAL_CONFIDENCE_THRESHOLD` (default: 0.8)
/// - `AURA_PHASE_RETRIES` (default: 3), `AURA_VISION_RETRIES` (default: 2)
/// - `AURA_IDLE_TIME_SECONDS` (default: 10), `AURA_STRUCTURE_CHARS`
///   (default: 10000)
/// - `AURA_FALLBACK_HIDE_COUNT` (default: 3)
///
/// ### Cache
/// - `AURA_CACHE_ENABLED`, `AURA_PIPELINE_TTL_SECONDS`,
///   `AURA_EXPLANATION_TTL_SECONDS`, `AURA_CACHE_MAX_ENTRIES`
///
/// ### Storage and observability
/// - `AURA_DATABASE_URL` (default: "sqlite://aura_identity.db")
/// - `AURA_LOG_LEVEL` (default: "info"), `AURA_METRICS_ENABLED`
///
/// ## Errors
/// An `LLM_PROVIDER` naming an unknown backend is rejected with
/// `ConfigError::UnsupportedProvider`.
pub fn load_from_env() -> Result<Config, Box<dyn std::error::Error>> {
    let config = Config {
        provider: load_provider_from_env()?,
        pipeline: load_pipeline_from_env()?,
        cache: load_cache_from_env()?,
        storage: load_storage_from_env()?,
        observability: load_observability_from_env()?
    };

    Ok(config)
}

fn load_provider_from_env() -> Result<LlmConfig, Box<dyn std::error::Error>> {
    let kind = match env::var("LLM_PROVIDER") {
        Ok(raw) => ProviderKind::from_str(raw.trim())
            .map_err(|_| ConfigError::UnsupportedProvider { kind: raw.clone() })?,
        Err(_) => ProviderKind::default()
    };

    let defaults = LlmConfig::default();

    Ok(LlmConfig {
        kind,
        timeout_seconds: parse_env("AURA_PROVIDER_TIMEOUT_SECONDS")
            .unwrap_or(defaults.timeout_seconds),
        ollama: OllamaConfig {
            host: env::var("OLLAMA_HOST").unwrap_or(defaults.ollama.host),
            model: env::var("OLLAMA_MODEL").unwrap_or(defaults.ollama.model)
        },
        gemini: GeminiConfig {
            api_key: env::var("GEMINI_API_KEY")
                .or_else(|_| env::var("GOOGLE_API_KEY"))
                .ok(),
            model: env::var("GEMINI_MODEL").unwrap_or(defaults.gemini.model),
            vision_model: env::var("GEMINI_VISION_MODEL").unwrap_or(defaults.gemini.vision_model),
            base_url: env::var("GEMINI_BASE_URL").unwrap_or(defaults.gemini.base_url)
        },
        openai: OpenAiConfig {
            api_key: env::var("OPENAI_API_KEY").ok(),
            model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai.model),
            base_url: env::var("OPENAI_BASE_URL").ok()
        }
    })
}

fn load_pipeline_from_env() -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let defaults = PipelineConfig::default();

    Ok(PipelineConfig {
        max_elements: parse_env("AURA_MAX_ELEMENTS").unwrap_or(defaults.max_elements),
        assessment_confidence_threshold: parse_env("AURA_ASSESSMENT_CONFIDENCE_THRESHOLD")
            .unwrap_or(defaults.assessment_confidence_threshold),
        adaptation_confidence_threshold: parse_env("AURA_ADAPTATION_CONFIDENCE_THRESHOLD")
            .unwrap_or(defaults.adaptation_confidence_threshold),
        visual_complexity_threshold: parse_env("AURA_VISUAL_COMPLEXITY_THRESHOLD")
            .unwrap_or(defaults.visual_complexity_threshold),
        visual_confidence_threshold: parse_env("AURA_VISUAL_CONFIDENCE_THRESHOLD")
            .unwrap_or(defaults.visual_confidence_threshold),
        phase_retries: parse_env("AURA_PHASE_RETRIES").unwrap_or(defaults.phase_retries),
        vision_retries: parse_env("AURA_VISION_RETRIES").unwrap_or(defaults.vision_retries),
        heuristics: HeuristicsConfig {
            idle_time_seconds: parse_env("AURA_IDLE_TIME_SECONDS")
                .unwrap_or(defaults.heuristics.idle_time_seconds),
            structure_chars: parse_env("AURA_STRUCTURE_CHARS")
                .unwrap_or(defaults.heuristics.structure_chars)
        },
        fallback_hide_count: parse_env("AURA_FALLBACK_HIDE_COUNT")
            .unwrap_or(defaults.fallback_hide_count)
    })
}

fn load_cache_from_env() -> Result<CacheConfig, Box<dyn std::error::Error>> {
    let defaults = CacheConfig::default();

    Ok(CacheConfig {
        enabled: parse_env("AURA_CACHE_ENABLED").unwrap_or(defaults.enabled),
        pipeline_ttl_seconds: parse_env("AURA_PIPELINE_TTL_SECONDS")
            .unwrap_or(defaults.pipeline_ttl_seconds),
        explanation_ttl_seconds: parse_env("AURA_EXPLANATION_TTL_SECONDS")
            .unwrap_or(defaults.explanation_ttl_seconds),
        max_entries: parse_env("AURA_CACHE_MAX_ENTRIES").unwrap_or(defaults.max_entries)
    })
}

fn load_storage_from_env() -> Result<StorageConfig, Box<dyn std::error::Error>> {
    Ok(StorageConfig {
        database_url: env::var("AURA_DATABASE_URL")
            .unwrap_or_else(|_| StorageConfig::default().database_url)
    })
}

fn load_observability_from_env() -> Result<ObservabilityConfig, Box<dyn std::error::Error>> {
    let defaults = ObservabilityConfig::default();

    Ok(ObservabilityConfig {
        logging_level: env::var("AURA_LOG_LEVEL").unwrap_or(defaults.logging_level),
        metrics_enabled: parse_env("AURA_METRICS_ENABLED").unwrap_or(defaults.metrics_enabled)
    })
}

fn parse_env<T>(key: &str) -> Result<T, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static
{
    match env::var(key) {
        Ok(s) => s
            .trim()
            .parse::<T>()
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>),
        Err(e) => Err(Box::new(e) as Box<dyn std::error::Error>)
    }
}
