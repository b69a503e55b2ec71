//! # Configuration System
//!
//! Centralized configuration management for the adaptive accessibility
//! pipeline.
//!
//! This crate provides:
//! - Configuration structures for provider, pipeline, cache, storage and
//!   observability
//! - Environment variable loading (12-factor app principles)
//! - Configuration file loading (TOML/YAML)
//! - Configuration precedence (CLI > env > file > defaults)
//! - Configuration validation

pub mod config;
pub mod file_loader;
pub mod loader;
pub mod precedence;
pub mod validator;

pub use config::{
    CacheConfig, Config, GeminiConfig, HeuristicsConfig, LlmConfig, ObservabilityConfig,
    OllamaConfig, OpenAiConfig, PipelineConfig, ProviderKind, StorageConfig
};
pub use file_loader::{ConfigFileError, load_from_file, load_from_toml, load_from_yaml};
pub use loader::load_from_env;
pub use precedence::merge_configs;
pub use self::validator::validate;
