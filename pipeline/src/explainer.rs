//! Cached natural-language page explanations, streamed explanations and
//! query-to-element matching.

use crate::cache::{FingerprintCache, fingerprint};
use crate::distiller::distill_html;
use crate::telemetry::PipelineTelemetry;
use aura_core::{CapabilityProvider, DistilledData, TextStream, UserProfile};
use config::CacheConfig;
use errors::ProviderError;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use strum::Display;
use tracing::{debug, info, instrument, warn};

pub const FORMATTING_ISSUE_SUMMARY: &str = "I'm sorry, I encountered a formatting issue while \
    explaining this page. Please try again in a moment.";

pub const PREFETCH_TIMEOUT: Duration = Duration::from_secs(10);

const SUMMARY_MARKER: &str = "SUMMARY:";
const ACTIONS_MARKER: &str = "ACTIONS:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExplanationResponse {
    pub summary: String,
    #[serde(default)]
    pub actions: Vec<String>
}

impl ExplanationResponse {
    fn formatting_issue() -> Self {
        Self {
            summary: FORMATTING_ISSUE_SUMMARY.to_string(),
            actions: Vec::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explained {
    pub explanation: ExplanationResponse,
    /// Served from the cache without a model call.
    pub cached: bool
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChunkKind {
    Summary,
    Action,
    Error
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationChunk {
    #[serde(rename = "type")]
    pub kind: ChunkKind,
    pub content: String
}

impl ExplanationChunk {
    fn new(kind: ChunkKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMatch {
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>
}

fn describe_page(distilled: &DistilledData, profile: Option<&UserProfile>) -> String {
    let needs = profile
        .and_then(|p| serde_json::to_string(p).ok())
        .unwrap_or_else(|| "General accessibility support".to_string());
    format!(
        "Page title: {}\nContent: {}\nPossible actions: {}\nUser needs: {needs}",
        distilled.title,
        serde_json::to_string(&distilled.summary).unwrap_or_default(),
        serde_json::to_string(&distilled.actions).unwrap_or_default()
    )
}

fn explanation_prompt(distilled: &DistilledData, profile: Option<&UserProfile>) -> String {
    format!(
        "Task: page_explanation\n\
         You are Aura, an accessibility companion. Explain what this page is for in 2-3 \
         short, calm sentences and list the most important things the user can do here.\n\
         Respond ONLY with a JSON object: {{\"summary\": \"...\", \"actions\": [\"...\"]}}\n\n{}",
        describe_page(distilled, profile)
    )
}

fn stream_prompt(distilled: &DistilledData, profile: Option<&UserProfile>) -> String {
    format!(
        "Task: streamed_explanation\n\
         You are Aura, an accessibility companion. Explain what this page is for in 2-3 \
         short, calm sentences, then list the most important things the user can do here.\n\
         Reply in plain text exactly as: SUMMARY: <summary> ACTIONS: <action>, <action>\n\n{}",
        describe_page(distilled, profile)
    )
}

fn find_action_prompt(distilled: &DistilledData, query: &str) -> String {
    format!(
        "Task: find_action\n\
         Based on these web elements, which one should the user interact with to: \"{query}\"?\n\
         Elements: {}\n\
         Respond ONLY with JSON like {{\"selector\": \"#submit-button\", \"explanation\": \
         \"Click this to send your form.\"}}\n\
         If nothing matches, respond with {{\"error\": \"No matching action found\"}}",
        serde_json::to_string(&distilled.actions).unwrap_or_default()
    )
}

fn parse_explanation(raw: &str) -> Option<ExplanationResponse> {
    serde_json::from_str::<ExplanationResponse>(utils::strip_code_fences(raw))
        .ok()
        .filter(|e| !e.summary.trim().is_empty())
}

/// Incremental parser for `SUMMARY: ... ACTIONS: a, b` text.
///
/// Text that could still turn into a marker is held back until the next
/// fragment arrives.
#[derive(Debug, Default)]
struct ChunkParser {
    buffer: String,
    prefix_checked: bool,
    in_actions: bool
}

impl ChunkParser {
    fn push(&mut self, fragment: &str) -> Vec<ExplanationChunk> {
        self.buffer.push_str(fragment);
        let mut out = Vec::new();

        if !self.prefix_checked {
            let trimmed = self.buffer.trim_start();
            if trimmed.len() < SUMMARY_MARKER.len() && SUMMARY_MARKER.starts_with(trimmed) {
                return out;
            }
            self.buffer = match trimmed.strip_prefix(SUMMARY_MARKER) {
                Some(rest) => rest.trim_start().to_string(),
                None => trimmed.to_string()
            };
            self.prefix_checked = true;
        }

        if !self.in_actions {
            match self.buffer.find(ACTIONS_MARKER) {
                Some(idx) => {
                    let summary = self.buffer[..idx].trim_end();
                    if !summary.trim().is_empty() {
                        out.push(ExplanationChunk::new(ChunkKind::Summary, summary));
                    }
                    self.buffer = self.buffer[idx + ACTIONS_MARKER.len()..].to_string();
                    self.in_actions = true;
                }
                None => {
                    let emit_to = self.buffer.len() - held_marker_len(&self.buffer);
                    let text: String = self.buffer.drain(..emit_to).collect();
                    if !text.trim().is_empty() {
                        out.push(ExplanationChunk::new(ChunkKind::Summary, text));
                    }
                    return out;
                }
            }
        }

        while let Some(idx) = self.buffer.find([',', '\n']) {
            let item = self.buffer[..idx].trim().to_string();
            self.buffer.drain(..=idx);
            if !item.is_empty() {
                out.push(ExplanationChunk::new(ChunkKind::Action, item));
            }
        }
        out
    }

    fn finish(&mut self) -> Vec<ExplanationChunk> {
        let rest = std::mem::take(&mut self.buffer);
        let text = rest.trim();
        if text.is_empty() {
            return Vec::new();
        }
        let kind = if self.in_actions {
            ChunkKind::Action
        } else {
            ChunkKind::Summary
        };
        vec![ExplanationChunk::new(kind, text)]
    }
}

/// Length of the longest buffer suffix that starts the actions marker.
fn held_marker_len(buffer: &str) -> usize {
    (1..ACTIONS_MARKER.len())
        .rev()
        .find(|&n| {
            buffer.len() >= n
                && buffer.is_char_boundary(buffer.len() - n)
                && ACTIONS_MARKER.starts_with(&buffer[buffer.len() - n..])
        })
        .unwrap_or(0)
}

fn replay(explanation: &ExplanationResponse) -> Vec<ExplanationChunk> {
    std::iter::once(ExplanationChunk::new(
        ChunkKind::Summary,
        explanation.summary.clone()
    ))
    .chain(
        explanation
            .actions
            .iter()
            .map(|a| ExplanationChunk::new(ChunkKind::Action, a.clone()))
    )
    .collect()
}

struct StreamState {
    inner: Option<TextStream>,
    parser: ChunkParser,
    pending: VecDeque<ExplanationChunk>,
    collected: ExplanationResponse,
    failed: bool,
    cache: Arc<FingerprintCache<ExplanationResponse>>,
    key: Option<String>
}

impl StreamState {
    fn absorb(&mut self, chunks: Vec<ExplanationChunk>) {
        for chunk in chunks {
            match chunk.kind {
                ChunkKind::Summary => self.collected.summary.push_str(&chunk.content),
                ChunkKind::Action => self.collected.actions.push(chunk.content.clone()),
                ChunkKind::Error => {}
            }
            self.pending.push_back(chunk);
        }
    }

    fn store(&mut self) {
        let summary = self.collected.summary.trim().to_string();
        if self.failed || summary.is_empty() {
            return;
        }
        if let Some(key) = self.key.take() {
            let actions = std::mem::take(&mut self.collected.actions);
            self.cache.set(key, ExplanationResponse { summary, actions });
        }
    }
}

pub struct Explainer {
    provider: Arc<dyn CapabilityProvider>,
    cache: Arc<FingerprintCache<ExplanationResponse>>,
    http: reqwest::Client,
    max_elements: usize,
    telemetry: Arc<PipelineTelemetry>
}

impl Explainer {
    pub fn new(
        provider: Arc<dyn CapabilityProvider>,
        cache: Arc<FingerprintCache<ExplanationResponse>>,
        max_elements: usize,
        telemetry: Arc<PipelineTelemetry>
    ) -> Self {
        Self {
            provider,
            cache,
            http: reqwest::Client::new(),
            max_elements,
            telemetry
        }
    }

    /// Build an explainer with its own explanation cache.
    pub fn with_cache_config(
        provider: Arc<dyn CapabilityProvider>,
        max_elements: usize,
        cache_config: &CacheConfig,
        telemetry: Arc<PipelineTelemetry>
    ) -> Self {
        let cache = if cache_config.enabled {
            FingerprintCache::new(
                "explanation",
                Duration::from_secs(cache_config.explanation_ttl_seconds),
                cache_config.max_entries,
                telemetry.clone()
            )
        } else {
            FingerprintCache::disabled("explanation", telemetry.clone())
        };
        Self::new(provider, Arc::new(cache), max_elements, telemetry)
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn cache(&self) -> &FingerprintCache<ExplanationResponse> {
        &self.cache
    }

    fn cache_key(distilled: &DistilledData, profile: Option<&UserProfile>) -> Option<String> {
        fingerprint(distilled, profile)
            .inspect_err(|e| warn!(error = %e, "Could not fingerprint page; cache bypassed"))
            .ok()
    }

    /// Explain a page, serving repeated requests from the cache.
    ///
    /// Unparseable model output becomes a polite apology and is not cached.
    #[instrument(skip_all, fields(url = %distilled.url))]
    pub async fn explain_page(
        &self,
        distilled: &DistilledData,
        profile: Option<&UserProfile>
    ) -> Result<Explained, ProviderError> {
        let key = Self::cache_key(distilled, profile);
        if let Some(explanation) = key.as_deref().and_then(|k| self.cache.get(k)) {
            debug!("Serving cached explanation");
            return Ok(Explained {
                explanation,
                cached: true
            });
        }

        self.telemetry
            .record_provider_call(self.provider.name(), "explain");
        let generation = self
            .provider
            .generate(&explanation_prompt(distilled, profile))
            .await?;

        let explanation = match parse_explanation(&generation.content) {
            Some(explanation) => {
                if let Some(key) = key {
                    self.cache.set(key, explanation.clone());
                }
                explanation
            }
            None => {
                warn!("Explanation output could not be parsed");
                ExplanationResponse::formatting_issue()
            }
        };
        Ok(Explained {
            explanation,
            cached: false
        })
    }

    /// Stream an explanation as summary and action chunks.
    ///
    /// Provider errors never escape: they end the stream with one `error`
    /// chunk. A completed stream is cached like [`Self::explain_page`].
    pub async fn stream_explanation(
        &self,
        distilled: &DistilledData,
        profile: Option<&UserProfile>
    ) -> BoxStream<'static, ExplanationChunk> {
        let key = Self::cache_key(distilled, profile);
        if let Some(explanation) = key.as_deref().and_then(|k| self.cache.get(k)) {
            debug!(url = %distilled.url, "Replaying cached explanation");
            return stream::iter(replay(&explanation)).boxed();
        }

        self.telemetry
            .record_provider_call(self.provider.name(), "explain_stream");
        let inner = match self
            .provider
            .generate_stream(&stream_prompt(distilled, profile))
            .await
        {
            Ok(inner) => inner,
            Err(e) => {
                warn!(url = %distilled.url, error = %e, "Explanation stream failed to start");
                return stream::iter([ExplanationChunk::new(ChunkKind::Error, e.to_string())])
                    .boxed();
            }
        };

        let state = StreamState {
            inner: Some(inner),
            parser: ChunkParser::default(),
            pending: VecDeque::new(),
            collected: ExplanationResponse {
                summary: String::new(),
                actions: Vec::new()
            },
            failed: false,
            cache: self.cache.clone(),
            key
        };

        stream::unfold(state, |mut st| async move {
            loop {
                if let Some(chunk) = st.pending.pop_front() {
                    return Some((chunk, st));
                }
                let next = match st.inner.as_mut() {
                    Some(inner) => inner.next().await,
                    None => return None
                };
                match next {
                    Some(Ok(fragment)) => {
                        let chunks = st.parser.push(&fragment);
                        st.absorb(chunks);
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Explanation stream interrupted");
                        st.inner = None;
                        st.failed = true;
                        st.pending
                            .push_back(ExplanationChunk::new(ChunkKind::Error, e.to_string()));
                    }
                    None => {
                        st.inner = None;
                        let chunks = st.parser.finish();
                        st.absorb(chunks);
                        st.store();
                    }
                }
            }
        })
        .boxed()
    }

    /// Map a natural-language request to one of the page's actions.
    ///
    /// `None` when the model finds no match or its answer is unusable.
    #[instrument(skip_all, fields(url = %distilled.url))]
    pub async fn find_action(
        &self,
        distilled: &DistilledData,
        query: &str
    ) -> Result<Option<ActionMatch>, ProviderError> {
        self.telemetry
            .record_provider_call(self.provider.name(), "find_action");
        let generation = self
            .provider
            .generate(&find_action_prompt(distilled, query))
            .await?;

        let found = serde_json::from_str::<ActionMatch>(utils::strip_code_fences(
            &generation.content
        ))
        .ok()
        .filter(|m| !m.selector.trim().is_empty());
        if found.is_none() {
            info!(query, "No matching action found");
        }
        Ok(found)
    }

    /// Fetch, distill and explain a page ahead of the user's request.
    ///
    /// The explanation lands in the cache under the anonymous profile.
    /// Failures are logged; returns whether an explanation was produced.
    #[instrument(skip(self))]
    pub async fn prefetch(&self, url: &str) -> bool {
        let html = match self.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "Prefetch download failed");
                return false;
            }
        };

        let distilled = distill_html(&html, url, self.max_elements);
        match self.explain_page(&distilled, None).await {
            Ok(explained) => {
                info!(cached = explained.cached, "Prefetched explanation");
                true
            }
            Err(e) => {
                warn!(error = %e, "Prefetch explanation failed");
                false
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, reqwest::Error> {
        self.http
            .get(url)
            .timeout(PREFETCH_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}
