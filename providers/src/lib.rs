//! # Capability Providers
//!
//! Text-generation backends behind the `CapabilityProvider` trait:
//! - `OllamaProvider`: local model server (NDJSON streaming, base64 images)
//! - `GeminiProvider`: hosted Gemini (SSE streaming, inline image data)
//! - `OpenAiProvider`: hosted OpenAI via `async-openai` (feature `openai`)
//! - `MockProvider`: scripted replies for tests and offline runs
//!
//! The variant is selected once at startup by [`create_provider`]. No
//! provider retries internally.

pub mod factory;
pub mod gemini;
pub mod mock;
pub mod ollama;
#[cfg(feature = "openai")]
pub mod openai;
pub mod stream;

pub use factory::create_provider;
pub use gemini::GeminiProvider;
pub use mock::{MockProvider, MockReply};
pub use ollama::OllamaProvider;
#[cfg(feature = "openai")]
pub use openai::OpenAiProvider;

use errors::ProviderError;
use std::time::Duration;

pub(crate) fn map_reqwest_error(
    provider: &str,
    timeout: Duration,
    err: reqwest::Error
) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout {
            provider: provider.to_string(),
            timeout_ms: timeout.as_millis() as u64
        }
    } else {
        ProviderError::transport(provider, err)
    }
}

/// Turns a non-success HTTP response into `ProviderError::Status`.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        provider: provider.to_string(),
        status: status.as_u16(),
        body
    })
}

pub(crate) fn build_http_client(
    provider: &str,
    timeout: Duration
) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Configuration {
            provider: provider.to_string(),
            reason: e.to_string()
        })
}
