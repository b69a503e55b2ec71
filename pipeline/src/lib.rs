//! # Aura Pipeline
//!
//! The adaptive inference pipeline: distillation, the heuristic gate, the
//! fingerprint cache, phased orchestration with its safety gate, and the
//! deterministic fallback. Visual verification, page explanations and the
//! session store sit beside it.
//!
//! ```text
//! DomData -> distill -> fingerprint -> cache? -> gate? -> assessment
//!         -> adaptation -> judge -> safety gate -> PipelineResult
//!                  (any phase error -> fallback)
//! ```

pub mod cache;
pub mod distiller;
pub mod explainer;
pub mod fallback;
pub mod heuristics;
pub mod orchestrator;
pub mod phases;
pub mod runtime;
pub mod safety;
pub mod session;
pub mod snapshot;
pub mod telemetry;
pub mod vision;

pub use cache::{FingerprintCache, fingerprint};
pub use distiller::{DEFAULT_MAX_ELEMENTS, distill, distill_html, distill_value};
pub use explainer::{
    ActionMatch, ChunkKind, Explained, Explainer, ExplanationChunk, ExplanationResponse
};
pub use fallback::{build_mock, should_apply_bionic};
pub use heuristics::{HeuristicGate, parse_logs, should_run_ai};
pub use orchestrator::PhaseOrchestrator;
pub use phases::{PIPELINE_PHASES, PhaseSpec, run_phase};
pub use runtime::AuraRuntime;
pub use safety::enforce_main_content_safety;
pub use session::{AgentSession, Message, SessionStore};
pub use snapshot::build_snapshot;
pub use telemetry::PipelineTelemetry;
pub use vision::{VerificationRequest, VisualVerifier, decode_screenshot};
