use crate::stream::{decode_lines, map_lines};
use crate::{build_http_client, check_status, map_reqwest_error};
use async_trait::async_trait;
use aura_core::{CapabilityProvider, Generation, ImageAttachment, TextStream};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use errors::ProviderError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER: &str = "gemini";

/// Hosted Gemini backend (`generateContent` / `streamGenerateContent`).
///
/// Text calls use `model`; calls carrying images use `vision_model`.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    vision_model: String,
    timeout: Duration
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Inline { inline_data: InlineData }
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    total_token_count: Option<u64>
}

impl GenerateContentResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

impl GeminiProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        vision_model: impl Into<String>,
        timeout: Duration
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_http_client(PROVIDER, timeout)?,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            vision_model: vision_model.into(),
            timeout
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn post(
        &self,
        url: String,
        body: &GenerateContentRequest
    ) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| map_reqwest_error(PROVIDER, self.timeout, e))?;
        check_status(PROVIDER, response).await
    }

    async fn complete(&self, model: &str, parts: Vec<Part>) -> Result<Generation, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![Content { parts }]
        };
        let response = self.post(self.endpoint(model, "generateContent"), &body).await?;
        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(PROVIDER, e))?;

        if parsed.candidates.is_empty() {
            return Err(ProviderError::invalid_response(PROVIDER, "no candidates returned"));
        }

        Ok(Generation {
            content: parsed.text(),
            total_tokens: parsed.usage_metadata.and_then(|u| u.total_token_count)
        })
    }
}

/// Decodes one server-sent event line (`data: {...}`).
fn extract_event(line: &str) -> Result<Option<String>, ProviderError> {
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let payload = payload.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return Ok(None);
    }
    let parsed: GenerateContentResponse =
        serde_json::from_str(payload).map_err(|e| ProviderError::invalid_response(PROVIDER, e))?;
    let text = parsed.text();
    if text.is_empty() { Ok(None) } else { Ok(Some(text)) }
}

#[async_trait]
impl CapabilityProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    #[tracing::instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<Generation, ProviderError> {
        let parts = vec![Part::Text {
            text: prompt.to_string()
        }];
        self.complete(&self.model, parts).await
    }

    async fn generate_stream(&self, prompt: &str) -> Result<TextStream, ProviderError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::Text {
                    text: prompt.to_string()
                }]
            }]
        };
        let url = format!("{}?alt=sse", self.endpoint(&self.model, "streamGenerateContent"));
        let response = self.post(url, &body).await?;
        let lines = decode_lines(response.bytes_stream(), PROVIDER);
        Ok(map_lines(lines, extract_event))
    }

    #[tracing::instrument(skip_all, fields(model = %self.vision_model, images = images.len()))]
    async fn generate_with_images(
        &self,
        prompt: &str,
        images: &[ImageAttachment]
    ) -> Result<Generation, ProviderError> {
        let mut parts = vec![Part::Text {
            text: prompt.to_string()
        }];
        parts.extend(images.iter().map(|image| Part::Inline {
            inline_data: InlineData {
                mime_type: image.mime_type.clone(),
                data: STANDARD.encode(&image.data)
            }
        }));
        self.complete(&self.vision_model, parts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_event() {
        let line = r#"data: {"candidates": [{"content": {"parts": [{"text": "Hi"}, {"text": "!"}]}}]}"#;
        assert_eq!(extract_event(line).unwrap(), Some("Hi!".to_string()));
        assert_eq!(extract_event(": keep-alive").unwrap(), None);
        assert_eq!(extract_event("data: [DONE]").unwrap(), None);
        assert!(extract_event("data: {broken").is_err());
    }

    #[test]
    fn test_inline_part_shape() {
        let part = Part::Inline {
            inline_data: InlineData {
                mime_type: "image/png".to_string(),
                data: "AAAA".to_string()
            }
        };
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value["inline_data"]["mime_type"], "image/png");
    }
}
