//! # Configuration Validation
//!
//! Field-level rules live on the structures as `validator` attributes. This
//! module adds the cross-field checks that need the whole configuration.

use crate::config::{Config, ProviderKind};
use errors::ConfigError;
use validator::Validate;

/// Validate configuration structure.
///
/// # M-CANONICAL-DOCS
///
/// ## Validation Rules
/// ### Field rules
/// - Confidence thresholds: 0.0-1.0
/// - `visual_complexity_threshold`: 1-10
/// - `phase_retries`, `vision_retries`: 1-10
/// - `timeout_seconds`: 1-600
/// - Provider URLs: http or https
/// - `logging_level`: trace/debug/info/warn/error
///
/// ### Cross-field rules
/// - The selected hosted provider must have an API key
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    config.validate().map_err(|e| ConfigError::Invalid {
        field: first_field(&e),
        reason: e.to_string()
    })?;

    match config.provider.kind {
        ProviderKind::Gemini if config.provider.gemini.api_key.is_none() => {
            Err(ConfigError::MissingCredential {
                provider: "gemini".to_string(),
                variable: "GEMINI_API_KEY".to_string()
            })
        }
        ProviderKind::OpenAi if config.provider.openai.api_key.is_none() => {
            Err(ConfigError::MissingCredential {
                provider: "openai".to_string(),
                variable: "OPENAI_API_KEY".to_string()
            })
        }
        _ => Ok(())
    }
}

fn first_field(errors: &validator::ValidationErrors) -> String {
    errors
        .errors()
        .keys()
        .next()
        .map(|k| k.to_string())
        .unwrap_or_else(|| "config".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_invalid_threshold() {
        let mut config = Config::default();
        config.pipeline.adaptation_confidence_threshold = -0.1;
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "pipeline"));
    }

    #[test]
    fn test_validate_invalid_complexity_threshold() {
        let mut config = Config::default();
        config.pipeline.visual_complexity_threshold = 11;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_zero_retries() {
        let mut config = Config::default();
        config.pipeline.phase_retries = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_invalid_ollama_host() {
        let mut config = Config::default();
        config.provider.ollama.host = "localhost:11434".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_invalid_logging_level() {
        let mut config = Config::default();
        config.observability.logging_level = "invalid".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_valid_logging_levels() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            let mut config = Config::default();
            config.observability.logging_level = level.to_string();
            assert!(validate(&config).is_ok());
        }
    }

    #[test]
    fn test_validate_hosted_provider_requires_key() {
        let mut config = Config::default();
        config.provider.kind = ProviderKind::Gemini;
        assert_eq!(
            validate(&config),
            Err(ConfigError::MissingCredential {
                provider: "gemini".to_string(),
                variable: "GEMINI_API_KEY".to_string()
            })
        );

        config.provider.gemini.api_key = Some("key".to_string());
        assert!(validate(&config).is_ok());

        config.provider.kind = ProviderKind::OpenAi;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_mock_needs_nothing() {
        let mut config = Config::default();
        config.provider.kind = ProviderKind::Mock;
        assert!(validate(&config).is_ok());
    }
}
