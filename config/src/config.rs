//! # Configuration Structures
//!
//! This module defines all configuration structures for the adaptive
//! accessibility pipeline.
//!
//! All configuration structures:
//! - Use `serde` for serialization/deserialization with per-field defaults
//! - Use `validator` for input validation

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

/// Main configuration structure for the pipeline.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Aggregates provider selection, pipeline thresholds, cache lifetimes,
/// profile storage and observability settings.
///
/// ## Usage
/// ```rust,no_run
/// use config::Config;
///
/// let config = Config::default();
/// println!("Provider: {}", config.provider.kind);
/// ```
///
/// ## Validation
/// Every nested section is validated when the top-level config is.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct Config {
    /// Capability provider selection and credentials
    #[serde(default)]
    #[validate(nested)]
    pub provider: LlmConfig,

    /// Orchestrator thresholds, retries and heuristics
    #[serde(default)]
    #[validate(nested)]
    pub pipeline: PipelineConfig,

    /// Fingerprint cache lifetimes
    #[serde(default)]
    #[validate(nested)]
    pub cache: CacheConfig,

    /// Profile store location
    #[serde(default)]
    #[validate(nested)]
    pub storage: StorageConfig,

    /// Logging and metrics
    #[serde(default)]
    #[validate(nested)]
    pub observability: ObservabilityConfig
}

/// Capability provider variants selectable at startup.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ProviderKind {
    #[default]
    Ollama,
    Gemini,
    #[serde(rename = "openai")]
    #[strum(to_string = "openai")]
    OpenAi,
    Mock
}

/// Capability provider configuration.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Selects the text-generation backend and carries the settings of every
/// variant so switching `kind` needs no other change.
///
/// ## Fields
/// - `kind`: Provider variant (default: ollama)
/// - `timeout_seconds`: Transport timeout per call (default: 60, range: 1-600)
/// - `ollama`, `gemini`, `openai`: Per-variant settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct LlmConfig {
    #[serde(default)]
    pub kind: ProviderKind,

    #[serde(default = "default_provider_timeout")]
    #[validate(range(min = 1, max = 600))]
    pub timeout_seconds: u64,

    #[serde(default)]
    #[validate(nested)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    #[validate(nested)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    #[validate(nested)]
    pub openai: OpenAiConfig
}

fn default_provider_timeout() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            timeout_seconds: default_provider_timeout(),
            ollama: OllamaConfig::default(),
            gemini: GeminiConfig::default(),
            openai: OpenAiConfig::default()
        }
    }
}

/// Local Ollama model server.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_host")]
    #[validate(custom(function = "validate_http_url"))]
    pub host: String,

    #[serde(default = "default_ollama_model")]
    #[validate(length(min = 1, max = 255))]
    pub model: String
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "qwen3:8b".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model()
        }
    }
}

/// Hosted Gemini backend.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct GeminiConfig {
    /// Read from `GEMINI_API_KEY` or `GOOGLE_API_KEY` when absent
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    #[validate(length(min = 1, max = 255))]
    pub model: String,

    /// Model used for screenshot verification
    #[serde(default = "default_gemini_vision_model")]
    #[validate(length(min = 1, max = 255))]
    pub vision_model: String,

    #[serde(default = "default_gemini_base_url")]
    #[validate(custom(function = "validate_http_url"))]
    pub base_url: String
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_vision_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            vision_model: default_gemini_vision_model(),
            base_url: default_gemini_base_url()
        }
    }
}

/// Hosted OpenAI backend.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_model")]
    #[validate(length(min = 1, max = 255))]
    pub model: String,

    /// Override for OpenAI-compatible gateways
    #[serde(default)]
    pub base_url: Option<String>
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            base_url: None
        }
    }
}

/// Phase orchestrator configuration.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Holds the confidence thresholds between phases, the structured-output
/// retry budgets, the heuristic gate triggers and distillation bounds.
///
/// ## Fields
/// - `max_elements`: Cap per distilled list (default: 40, range: 1-500)
/// - `assessment_confidence_threshold`: Below this the pipeline suggests help
///   (default: 0.5)
/// - `adaptation_confidence_threshold`: Below this the pipeline suggests help
///   (default: 0.6)
/// - `visual_complexity_threshold`: Complexity above this requires visual
///   validation (default: 7)
/// - `visual_confidence_threshold`: Adaptation confidence below this requires
///   visual validation (default: 0.8)
/// - `phase_retries`: Output attempts for assessment/adaptation/judge
///   (default: 3, range: 1-10)
/// - `vision_retries`: Output attempts for visual verification (default: 2)
/// - `heuristics`: Gate triggers
/// - `fallback_hide_count`: Navigation selectors hidden by the fallback
///   (default: 3)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct PipelineConfig {
    #[serde(default = "default_max_elements")]
    #[validate(range(min = 1, max = 500))]
    pub max_elements: usize,

    #[serde(default = "default_assessment_threshold")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub assessment_confidence_threshold: f64,

    #[serde(default = "default_adaptation_threshold")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub adaptation_confidence_threshold: f64,

    #[serde(default = "default_visual_complexity_threshold")]
    #[validate(range(min = 1, max = 10))]
    pub visual_complexity_threshold: u8,

    #[serde(default = "default_visual_confidence_threshold")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub visual_confidence_threshold: f64,

    #[serde(default = "default_phase_retries")]
    #[validate(range(min = 1, max = 10))]
    pub phase_retries: u32,

    #[serde(default = "default_vision_retries")]
    #[validate(range(min = 1, max = 10))]
    pub vision_retries: u32,

    #[serde(default)]
    #[validate(nested)]
    pub heuristics: HeuristicsConfig,

    #[serde(default = "default_fallback_hide_count")]
    #[validate(range(max = 20))]
    pub fallback_hide_count: usize
}

fn default_max_elements() -> usize {
    40
}

fn default_assessment_threshold() -> f64 {
    0.5
}

fn default_adaptation_threshold() -> f64 {
    0.6
}

fn default_visual_complexity_threshold() -> u8 {
    7
}

fn default_visual_confidence_threshold() -> f64 {
    0.8
}

fn default_phase_retries() -> u32 {
    3
}

fn default_vision_retries() -> u32 {
    2
}

fn default_fallback_hide_count() -> usize {
    3
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_elements: default_max_elements(),
            assessment_confidence_threshold: default_assessment_threshold(),
            adaptation_confidence_threshold: default_adaptation_threshold(),
            visual_complexity_threshold: default_visual_complexity_threshold(),
            visual_confidence_threshold: default_visual_confidence_threshold(),
            phase_retries: default_phase_retries(),
            vision_retries: default_vision_retries(),
            heuristics: HeuristicsConfig::default(),
            fallback_hide_count: default_fallback_hide_count()
        }
    }
}

/// Heuristic gate triggers. Counters (`scroll_loops`, `rage_clicks`) fire on
/// any positive value and have no setting.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct HeuristicsConfig {
    /// Idle seconds strictly above which the gate opens
    #[serde(default = "default_idle_time_seconds")]
    #[validate(range(min = 0.0))]
    pub idle_time_seconds: f64,

    /// Structural size in characters strictly above which the gate opens
    #[serde(default = "default_structure_chars")]
    #[validate(range(min = 1))]
    pub structure_chars: usize
}

fn default_idle_time_seconds() -> f64 {
    10.0
}

fn default_structure_chars() -> usize {
    10_000
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            idle_time_seconds: default_idle_time_seconds(),
            structure_chars: default_structure_chars()
        }
    }
}

/// Fingerprint cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Lifetime of cached pipeline results
    #[serde(default = "default_pipeline_ttl")]
    #[validate(range(min = 1, max = 86400))]
    pub pipeline_ttl_seconds: u64,

    /// Lifetime of cached page explanations
    #[serde(default = "default_explanation_ttl")]
    #[validate(range(min = 1, max = 86400))]
    pub explanation_ttl_seconds: u64,

    #[serde(default = "default_cache_max_entries")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub max_entries: usize
}

fn default_cache_enabled() -> bool {
    true
}

fn default_pipeline_ttl() -> u64 {
    1800
}

fn default_explanation_ttl() -> u64 {
    1800
}

fn default_cache_max_entries() -> usize {
    10_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            pipeline_ttl_seconds: default_pipeline_ttl(),
            explanation_ttl_seconds: default_explanation_ttl(),
            max_entries: default_cache_max_entries()
        }
    }
}

/// Profile store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct StorageConfig {
    /// SQLite connection string, or `memory` for the in-process store
    #[serde(default = "default_database_url")]
    #[validate(length(min = 1))]
    pub database_url: String
}

fn default_database_url() -> String {
    "sqlite://aura_identity.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url()
        }
    }
}

/// Observability configuration.
///
/// # M-CANONICAL-DOCS
///
/// ## Fields
/// - `logging_level`: Logging level used when `RUST_LOG` is unset
///   (trace/debug/info/warn/error, default: "info")
/// - `metrics_enabled`: Emit pipeline metrics (default: true)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ObservabilityConfig {
    #[serde(default = "default_observability_logging_level")]
    #[validate(custom(function = "validate_logging_level"))]
    pub logging_level: String,

    #[serde(default = "default_observability_metrics_enabled")]
    pub metrics_enabled: bool
}

fn default_observability_logging_level() -> String {
    "info".to_string()
}

fn default_observability_metrics_enabled() -> bool {
    true
}

fn validate_logging_level(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(validator::ValidationError::new("Invalid logging level"))
    }
}

fn validate_http_url(value: &str) -> Result<(), validator::ValidationError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(validator::ValidationError::new("URL must use http or https"))
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            logging_level: default_observability_logging_level(),
            metrics_enabled: default_observability_metrics_enabled()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.provider.kind, ProviderKind::Ollama);
        assert_eq!(config.provider.ollama.host, "http://localhost:11434");
        assert_eq!(config.provider.ollama.model, "qwen3:8b");
        assert_eq!(config.provider.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.provider.openai.model, "gpt-4o");
        assert_eq!(config.pipeline.max_elements, 40);
        assert_eq!(config.pipeline.heuristics.structure_chars, 10_000);
        assert_eq!(config.cache.explanation_ttl_seconds, 1800);
        assert_eq!(config.storage.database_url, "sqlite://aura_identity.db");
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!(ProviderKind::from_str("openai").unwrap(), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::from_str("GEMINI").unwrap(), ProviderKind::Gemini);
        assert_eq!(ProviderKind::OpenAi.to_string(), "openai");
        assert!(ProviderKind::from_str("anthropic").is_err());

        let kind: ProviderKind = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(kind, ProviderKind::OpenAi);
    }

    #[test]
    fn test_nested_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.pipeline.assessment_confidence_threshold = 1.5;
        assert!(config.validate().is_err());
    }
}
