//! Boundary traits for the adaptive accessibility pipeline

use crate::profile::{Feedback, UserProfile};
use async_trait::async_trait;
use errors::{ProviderError, StoreError};
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Lazy sequence of text fragments produced by a streaming generation.
pub type TextStream = BoxStream<'static, Result<String, ProviderError>>;

/// One completed generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>
}

impl Generation {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            total_tokens: None
        }
    }
}

/// Decoded image passed alongside a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data: Vec<u8>
}

/// External text-generation capability.
///
/// Implementations surface every failure as a `ProviderError` and never retry
/// internally.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Short provider name used in logs, metrics and errors.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<Generation, ProviderError>;

    async fn generate_stream(&self, prompt: &str) -> Result<TextStream, ProviderError>;

    async fn generate_with_images(
        &self,
        _prompt: &str,
        _images: &[ImageAttachment]
    ) -> Result<Generation, ProviderError> {
        Err(ProviderError::Unsupported {
            provider: self.name().to_string(),
            capability: "image input".to_string()
        })
    }
}

/// Key-value persistence for user profiles and adaptation feedback.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn save(&self, profile: &UserProfile) -> Result<(), StoreError>;

    async fn load(&self, aura_id: &str) -> Result<Option<UserProfile>, StoreError>;

    async fn record_feedback(&self, feedback: &Feedback) -> Result<(), StoreError>;
}
