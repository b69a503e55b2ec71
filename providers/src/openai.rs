use async_openai::types::chat::{
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs
};
use async_trait::async_trait;
use aura_core::{CapabilityProvider, Generation, TextStream};
use errors::ProviderError;
use futures_util::StreamExt;
use std::time::Duration;

const PROVIDER: &str = "openai";

/// Hosted OpenAI chat completions. Image input is not wired; verification
/// calls report `Unsupported`.
pub struct OpenAiProvider {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    timeout: Duration
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, base_url: Option<String>, timeout: Duration) -> Self {
        let mut config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        if let Some(base_url) = base_url {
            config = config.with_api_base(base_url);
        }
        let client = async_openai::Client::with_config(config);

        Self {
            client,
            model,
            timeout
        }
    }

    fn request(&self, prompt: &str, stream: bool) -> Result<CreateChatCompletionRequest, ProviderError> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| ProviderError::Configuration {
                provider: PROVIDER.to_string(),
                reason: e.to_string()
            })?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model).messages([message.into()]);
        if stream {
            builder.stream(true);
        }
        builder.build().map_err(|e| ProviderError::Configuration {
            provider: PROVIDER.to_string(),
            reason: e.to_string()
        })
    }

    fn timed_out(&self) -> ProviderError {
        ProviderError::Timeout {
            provider: PROVIDER.to_string(),
            timeout_ms: self.timeout.as_millis() as u64
        }
    }
}

#[async_trait]
impl CapabilityProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    #[tracing::instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<Generation, ProviderError> {
        let request = self.request(prompt, false)?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| self.timed_out())?
            .map_err(|e| ProviderError::transport(PROVIDER, e))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| ProviderError::invalid_response(PROVIDER, "empty response"))?;

        Ok(Generation {
            content,
            total_tokens: response.usage.map(|u| u64::from(u.total_tokens))
        })
    }

    async fn generate_stream(&self, prompt: &str) -> Result<TextStream, ProviderError> {
        let request = self.request(prompt, true)?;

        let stream = tokio::time::timeout(self.timeout, self.client.chat().create_stream(request))
            .await
            .map_err(|_| self.timed_out())?
            .map_err(|e| ProviderError::transport(PROVIDER, e))?;

        let fragments = stream.filter_map(|item| {
            let mapped = match item {
                Ok(chunk) => chunk
                    .choices
                    .into_iter()
                    .filter_map(|choice| choice.delta.content)
                    .reduce(|mut acc, part| {
                        acc.push_str(&part);
                        acc
                    })
                    .filter(|text| !text.is_empty())
                    .map(Ok),
                Err(e) => Some(Err(ProviderError::transport(PROVIDER, e)))
            };
            futures_util::future::ready(mapped)
        });

        Ok(fragments.boxed())
    }
}
