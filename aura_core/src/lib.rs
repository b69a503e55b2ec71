//! # Aura Core
//!
//! Shared types and traits for the adaptive accessibility pipeline.
//!
//! This crate provides:
//! - The user capability profile
//! - Raw and distilled page representations, and the interaction snapshot
//! - Structured outputs of every inference phase
//! - The tagged pipeline result handed back to callers
//! - Boundary traits for capability providers and profile stores

pub mod page;
pub mod phases;
pub mod profile;
pub mod result;
pub mod traits;

pub use page::{
    DEFAULT_MAIN_SELECTOR, DistilledData, DistilledElement, DomData, DomElement, ElementRole,
    PageSnapshot
};
pub use phases::{
    AccessibilityAssessment, JudgeResult, LayoutMode, Recommendation, RiskLevel, Theme,
    UIAdaptationDecision, VisionVerdict
};
pub use profile::{
    CognitiveProfile, Feedback, InputChannel, ModalityPreferences, MotorProfile, OutputChannel,
    PrecisionTier, SensoryProfile, SupportLevel, UserProfile, VisionAcuity
};
pub use result::{PipelineResult, ResultMode, UiCommand};
pub use traits::{CapabilityProvider, Generation, ImageAttachment, ProfileStore, TextStream};
