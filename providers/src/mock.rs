use async_trait::async_trait;
use aura_core::{CapabilityProvider, Generation, ImageAttachment, TextStream};
use errors::ProviderError;
use futures_util::StreamExt;
use std::collections::VecDeque;
use tokio::sync::RwLock;

const PROVIDER: &str = "mock";

/// One scripted answer.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    Text(String),
    Fail(ProviderError),
    /// Streams `text` then fails with `error`; `generate` returns the error.
    Partial { text: String, error: ProviderError }
}

impl From<&str> for MockReply {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for MockReply {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

struct Rule {
    needle: String,
    replies: VecDeque<MockReply>
}

impl Rule {
    /// Queued replies are consumed in order; the last one repeats.
    fn next_reply(&mut self) -> Option<MockReply> {
        if self.replies.len() > 1 {
            self.replies.pop_front()
        } else {
            self.replies.front().cloned()
        }
    }
}

/// Scripted provider matching prompts by substring.
///
/// Rules are checked in insertion order. Unmatched prompts get the default
/// reply, or an echo of the prompt when none is set. Every prompt is logged.
pub struct MockProvider {
    rules: RwLock<Vec<Rule>>,
    default: RwLock<Option<MockReply>>,
    calls: RwLock<Vec<String>>
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
            default: RwLock::new(None),
            calls: RwLock::new(Vec::new())
        }
    }

    pub fn with_reply(self, needle: &str, reply: impl Into<MockReply>) -> Self {
        self.with_replies(needle, vec![reply.into()])
    }

    pub fn with_replies(mut self, needle: &str, replies: Vec<MockReply>) -> Self {
        self.rules.get_mut().push(Rule {
            needle: needle.to_string(),
            replies: replies.into()
        });
        self
    }

    pub fn with_failure(self, needle: &str, error: ProviderError) -> Self {
        self.with_reply(needle, MockReply::Fail(error))
    }

    pub fn with_default(mut self, reply: impl Into<MockReply>) -> Self {
        *self.default.get_mut() = Some(reply.into());
        self
    }

    pub async fn add_response(&self, needle: &str, reply: impl Into<MockReply>) {
        let mut rules = self.rules.write().await;
        rules.push(Rule {
            needle: needle.to_string(),
            replies: VecDeque::from([reply.into()])
        });
    }

    pub async fn set_response(&self, reply: impl Into<MockReply>) {
        *self.default.write().await = Some(reply.into());
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Number of logged prompts containing `needle`.
    pub async fn calls_matching(&self, needle: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|p| p.contains(needle))
            .count()
    }

    async fn reply_for(&self, prompt: &str) -> MockReply {
        self.calls.write().await.push(prompt.to_string());

        let mut rules = self.rules.write().await;
        if let Some(reply) = rules
            .iter_mut()
            .find(|rule| prompt.contains(&rule.needle))
            .and_then(Rule::next_reply)
        {
            return reply;
        }
        drop(rules);

        match self.default.read().await.clone() {
            Some(reply) => reply,
            None => MockReply::Text(format!("Mock response for: {prompt}"))
        }
    }
}

/// Splits text into word fragments that keep their trailing whitespace.
fn fragments(text: &str) -> Vec<String> {
    text.split_inclusive(' ').map(str::to_string).collect()
}

#[async_trait]
impl CapabilityProvider for MockProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, prompt: &str) -> Result<Generation, ProviderError> {
        match self.reply_for(prompt).await {
            MockReply::Text(text) => Ok(Generation::text(text)),
            MockReply::Fail(error) | MockReply::Partial { error, .. } => Err(error)
        }
    }

    async fn generate_stream(&self, prompt: &str) -> Result<TextStream, ProviderError> {
        match self.reply_for(prompt).await {
            MockReply::Text(text) => {
                let items: Vec<Result<String, ProviderError>> =
                    fragments(&text).into_iter().map(Ok).collect();
                Ok(futures_util::stream::iter(items).boxed())
            }
            MockReply::Fail(error) => Err(error),
            MockReply::Partial { text, error } => {
                let mut items: Vec<Result<String, ProviderError>> =
                    fragments(&text).into_iter().map(Ok).collect();
                items.push(Err(error));
                Ok(futures_util::stream::iter(items).boxed())
            }
        }
    }

    async fn generate_with_images(
        &self,
        prompt: &str,
        _images: &[ImageAttachment]
    ) -> Result<Generation, ProviderError> {
        self.generate(prompt).await
    }
}
