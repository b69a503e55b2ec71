//! Structured outputs of the inference phases.
//!
//! Every phase output is untrusted model inference. Range invariants are
//! declared with `validator` and checked after decoding; the JSON Schema
//! derived with `schemars` is embedded in the phase prompt.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    EnumString,
    Display
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    EnumString,
    Display
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LayoutMode {
    Normal,
    Simplified,
    Focus
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    EnumString,
    Display
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Theme {
    Dark,
    Contrast
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    EnumString,
    Display
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Recommendation {
    Keep,
    Refine,
    Rollback
}

/// Output of the assessment phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct AccessibilityAssessment {
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub issues: Vec<String>,
    #[validate(range(min = 1, max = 10))]
    pub complexity_score: u8,
    pub primary_goal: String,
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64
}

/// Output of the adaptation phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct UIAdaptationDecision {
    pub overloaded: bool,
    pub layout_mode: LayoutMode,
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub hide_elements: Vec<String>,
    #[serde(default)]
    pub highlight_elements: Vec<String>,
    pub explanation: String,
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64
}

/// Output of the judge phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct JudgeResult {
    pub success: bool,
    /// Rejection reasons; empty when the proposal is accepted.
    #[serde(default, alias = "errors")]
    pub reasons: Vec<String>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64
}

/// Output of the visual verification phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct VisionVerdict {
    pub success: bool,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub improvement_score: f64,
    #[serde(default)]
    pub new_issues: Vec<String>,
    pub recommendation: Recommendation,
    #[serde(default)]
    pub explanation: String
}

impl VisionVerdict {
    /// Verdict returned when verification itself could not run.
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            improvement_score: 0.0,
            new_issues: Vec::new(),
            recommendation: Recommendation::Keep,
            explanation: format!("Verification failed: {reason}")
        }
    }
}
