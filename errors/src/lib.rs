//! # Aura Errors
//!
//! Error taxonomy shared by every crate of the adaptive accessibility
//! pipeline.
//!
//! - `thiserror` for structured definitions with named fields
//! - One error type per boundary: providers, phases, storage, config
//! - Expected outcomes (gate skips, low confidence, judge rejections) are not
//!   errors and never appear here

use serde::Serialize;
use thiserror::Error;

/// The single error type surfaced by every capability provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Transport failure talking to {provider}: {reason}")]
    Transport { provider: String, reason: String },

    #[error("{provider} answered with status {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String
    },

    #[error("{provider} did not answer within {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("{provider} does not support {capability}")]
    Unsupported {
        provider: String,
        capability: String
    },

    #[error("{provider} is misconfigured: {reason}")]
    Configuration { provider: String, reason: String }
}

impl ProviderError {
    pub fn transport(provider: &str, reason: impl ToString) -> Self {
        Self::Transport {
            provider: provider.to_string(),
            reason: reason.to_string()
        }
    }

    pub fn invalid_response(provider: &str, reason: impl ToString) -> Self {
        Self::InvalidResponse {
            provider: provider.to_string(),
            reason: reason.to_string()
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            Self::Transport { provider, .. }
            | Self::Status { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::InvalidResponse { provider, .. }
            | Self::Unsupported { provider, .. }
            | Self::Configuration { provider, .. } => provider
        }
    }

    /// Connection-level failures: the request never produced a usable answer.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}

/// Enumerable failure modes of a single phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseFailureKind {
    Provider,
    MalformedOutput,
    SchemaViolation
}

impl std::fmt::Display for PhaseFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Provider => "provider",
            Self::MalformedOutput => "malformed_output",
            Self::SchemaViolation => "schema_violation"
        };
        f.write_str(label)
    }
}

/// Failure of one structured-output phase (assessment, adaptation, judge,
/// vision).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhaseError {
    #[error("Phase {phase}: provider call failed: {source}")]
    Provider {
        phase: String,
        #[source]
        source: ProviderError
    },

    #[error("Phase {phase}: output is not valid JSON: {reason}")]
    MalformedOutput { phase: String, reason: String },

    #[error("Phase {phase}: output violates schema: {reason}")]
    SchemaViolation { phase: String, reason: String },

    #[error("Phase {phase}: gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        phase: String,
        attempts: u32,
        last: Box<PhaseError>
    }
}

impl PhaseError {
    pub fn phase(&self) -> &str {
        match self {
            Self::Provider { phase, .. }
            | Self::MalformedOutput { phase, .. }
            | Self::SchemaViolation { phase, .. }
            | Self::RetriesExhausted { phase, .. } => phase
        }
    }

    pub fn kind(&self) -> PhaseFailureKind {
        match self {
            Self::Provider { .. } => PhaseFailureKind::Provider,
            Self::MalformedOutput { .. } => PhaseFailureKind::MalformedOutput,
            Self::SchemaViolation { .. } => PhaseFailureKind::SchemaViolation,
            Self::RetriesExhausted { last, .. } => last.kind()
        }
    }

    /// Output-level failures are re-prompted; provider failures are not.
    pub fn is_output_failure(&self) -> bool {
        matches!(
            self,
            Self::MalformedOutput { .. } | Self::SchemaViolation { .. }
        )
    }
}

/// Internal per-element distillation failures. Never escapes the distiller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DistillError {
    #[error("Element {index} has no usable role")]
    MissingRole { index: usize },

    #[error("Element {index} could not be read: {reason}")]
    UnreadableElement { index: usize, reason: String },

    #[error("HTML document could not be distilled: {reason}")]
    Html { reason: String }
}

/// Fingerprint cache errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Fingerprint serialization failed: {reason}")]
    Serialization { reason: String }
}

/// Profile store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection to {backend} failed: {reason}")]
    Connection { backend: String, reason: String },

    #[error("Query on {backend} failed: {reason}")]
    Query { backend: String, reason: String },

    #[error("Profile serialization failed: {reason}")]
    Serialization { reason: String }
}

/// Configuration errors raised while building runtime components.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("Unsupported LLM provider: {kind}")]
    UnsupportedProvider { kind: String },

    #[error("{provider} requires {variable} to be set")]
    MissingCredential { provider: String, variable: String }
}

/// Visual verification input errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Screenshot could not be decoded: {reason}")]
    InvalidScreenshot { reason: String }
}
