use crate::{GeminiProvider, MockProvider, OllamaProvider};
use aura_core::CapabilityProvider;
use config::{LlmConfig, ProviderKind};
use errors::{ConfigError, ProviderError};
use std::sync::Arc;
use std::time::Duration;

/// Builds the configured provider. Called once at startup.
///
/// # Errors
/// - `MissingCredential` when a hosted provider has no API key
/// - `UnsupportedProvider` when `openai` is selected without the `openai`
///   feature
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn CapabilityProvider>, ConfigError> {
    let timeout = Duration::from_secs(config.timeout_seconds);

    let provider: Arc<dyn CapabilityProvider> = match config.kind {
        ProviderKind::Ollama => Arc::new(
            OllamaProvider::new(&config.ollama.host, &config.ollama.model, timeout)
                .map_err(invalid)?
        ),
        ProviderKind::Gemini => {
            let api_key =
                config
                    .gemini
                    .api_key
                    .clone()
                    .ok_or_else(|| ConfigError::MissingCredential {
                        provider: "gemini".to_string(),
                        variable: "GEMINI_API_KEY".to_string()
                    })?;
            Arc::new(
                GeminiProvider::new(
                    api_key,
                    &config.gemini.base_url,
                    &config.gemini.model,
                    &config.gemini.vision_model,
                    timeout
                )
                .map_err(invalid)?
            )
        }
        ProviderKind::OpenAi => create_openai(config, timeout)?,
        ProviderKind::Mock => Arc::new(MockProvider::new())
    };

    tracing::info!(provider = provider.name(), "Capability provider initialized");
    Ok(provider)
}

fn invalid(err: ProviderError) -> ConfigError {
    ConfigError::Invalid {
        field: "provider".to_string(),
        reason: err.to_string()
    }
}

#[cfg(feature = "openai")]
fn create_openai(
    config: &LlmConfig,
    timeout: Duration
) -> Result<Arc<dyn CapabilityProvider>, ConfigError> {
    let api_key = config
        .openai
        .api_key
        .clone()
        .ok_or_else(|| ConfigError::MissingCredential {
            provider: "openai".to_string(),
            variable: "OPENAI_API_KEY".to_string()
        })?;
    Ok(Arc::new(crate::OpenAiProvider::new(
        api_key,
        config.openai.model.clone(),
        config.openai.base_url.clone(),
        timeout
    )))
}

#[cfg(not(feature = "openai"))]
fn create_openai(
    _config: &LlmConfig,
    _timeout: Duration
) -> Result<Arc<dyn CapabilityProvider>, ConfigError> {
    Err(ConfigError::UnsupportedProvider {
        kind: "openai".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_default_is_ollama() {
        let provider = create_provider(&LlmConfig::default()).unwrap();
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_create_mock() {
        let config = LlmConfig {
            kind: ProviderKind::Mock,
            ..LlmConfig::default()
        };
        assert_eq!(create_provider(&config).unwrap().name(), "mock");
    }

    #[test]
    fn test_gemini_requires_key() {
        let mut config = LlmConfig {
            kind: ProviderKind::Gemini,
            ..LlmConfig::default()
        };
        assert!(matches!(
            create_provider(&config),
            Err(ConfigError::MissingCredential { .. })
        ));

        config.gemini.api_key = Some("key".to_string());
        assert_eq!(create_provider(&config).unwrap().name(), "gemini");
    }

    #[cfg(not(feature = "openai"))]
    #[test]
    fn test_openai_without_feature() {
        let config = LlmConfig {
            kind: ProviderKind::OpenAi,
            ..LlmConfig::default()
        };
        assert!(matches!(
            create_provider(&config),
            Err(ConfigError::UnsupportedProvider { .. })
        ));
    }
}
