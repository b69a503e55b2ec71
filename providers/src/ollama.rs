use crate::stream::{decode_lines, map_lines};
use crate::{build_http_client, check_status, map_reqwest_error};
use async_trait::async_trait;
use aura_core::{CapabilityProvider, Generation, ImageAttachment, TextStream};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use errors::ProviderError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER: &str = "ollama";

/// Local Ollama model server (`/api/generate`).
pub struct OllamaProvider {
    client: reqwest::Client,
    host: String,
    model: String,
    timeout: Duration
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    eval_count: Option<u64>,
    #[serde(default)]
    prompt_eval_count: Option<u64>
}

#[derive(Deserialize)]
struct StreamLine {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>
}

impl OllamaProvider {
    pub fn new(
        host: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_http_client(PROVIDER, timeout)?,
            host: host.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.host)
    }

    async fn post(&self, body: &GenerateRequest<'_>) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(self.endpoint())
            .json(body)
            .send()
            .await
            .map_err(|e| map_reqwest_error(PROVIDER, self.timeout, e))?;
        check_status(PROVIDER, response).await
    }

    async fn complete(&self, prompt: &str, images: Vec<String>) -> Result<Generation, ProviderError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            images
        };
        let response = self.post(&body).await?;
        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(PROVIDER, e))?;

        let total_tokens = match (parsed.prompt_eval_count, parsed.eval_count) {
            (None, None) => None,
            (prompt_tokens, eval) => Some(prompt_tokens.unwrap_or(0) + eval.unwrap_or(0))
        };

        Ok(Generation {
            content: parsed.response,
            total_tokens
        })
    }
}

fn extract_fragment(line: &str) -> Result<Option<String>, ProviderError> {
    let parsed: StreamLine =
        serde_json::from_str(line).map_err(|e| ProviderError::invalid_response(PROVIDER, e))?;
    if let Some(error) = parsed.error {
        return Err(ProviderError::invalid_response(PROVIDER, error));
    }
    if parsed.response.is_empty() {
        Ok(None)
    } else {
        Ok(Some(parsed.response))
    }
}

#[async_trait]
impl CapabilityProvider for OllamaProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    #[tracing::instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<Generation, ProviderError> {
        self.complete(prompt, Vec::new()).await
    }

    async fn generate_stream(&self, prompt: &str) -> Result<TextStream, ProviderError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: true,
            images: Vec::new()
        };
        let response = self.post(&body).await?;
        let lines = decode_lines(response.bytes_stream(), PROVIDER);
        Ok(map_lines(lines, extract_fragment))
    }

    async fn generate_with_images(
        &self,
        prompt: &str,
        images: &[ImageAttachment]
    ) -> Result<Generation, ProviderError> {
        let encoded = images.iter().map(|i| STANDARD.encode(&i.data)).collect();
        self.complete(prompt, encoded).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fragment() {
        assert_eq!(
            extract_fragment(r#"{"response": "Hel", "done": false}"#).unwrap(),
            Some("Hel".to_string())
        );
        assert_eq!(extract_fragment(r#"{"response": "", "done": true}"#).unwrap(), None);
        assert!(extract_fragment(r#"{"error": "model not found"}"#).is_err());
        assert!(extract_fragment("not json").is_err());
    }

    #[test]
    fn test_host_trailing_slash() {
        let provider =
            OllamaProvider::new("http://localhost:11434/", "qwen3:8b", Duration::from_secs(5))
                .unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:11434/api/generate");
    }
}
