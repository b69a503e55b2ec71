//! The tagged result every pipeline invocation hands back to its caller.

use crate::phases::{LayoutMode, Theme};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Distinguishes model-backed results from the deterministic safety net.
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
pub enum ResultMode {
    PhasedAgent,
    MockFallback
}

/// Structural change handed to the page renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UiCommand {
    pub layout_mode: LayoutMode,
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub hide_elements: Vec<String>,
    #[serde(default)]
    pub highlight_elements: Vec<String>,
    pub explanation: String,
    #[serde(default)]
    pub visual_validation_required: bool,
    #[serde(default)]
    pub bionic_reading: bool
}

/// Outcome of `process_page`.
///
/// Serialized with an `action` tag (`none`, `suggest_help`, `warn`,
/// `apply_ui`) and always carries a `mode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PipelineResult {
    #[serde(rename = "none")]
    NoAction { mode: ResultMode, reason: String },
    SuggestHelp {
        mode: ResultMode,
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
        confidence: f64
    },
    Warn {
        mode: ResultMode,
        message: String,
        #[serde(default)]
        reasons: Vec<String>
    },
    ApplyUi {
        mode: ResultMode,
        ui_command: UiCommand,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        primary_goal: Option<String>
    }
}

impl PipelineResult {
    pub fn action(&self) -> &'static str {
        match self {
            Self::NoAction { .. } => "none",
            Self::SuggestHelp { .. } => "suggest_help",
            Self::Warn { .. } => "warn",
            Self::ApplyUi { .. } => "apply_ui"
        }
    }

    pub fn mode(&self) -> ResultMode {
        match self {
            Self::NoAction { mode, .. }
            | Self::SuggestHelp { mode, .. }
            | Self::Warn { mode, .. }
            | Self::ApplyUi { mode, .. } => *mode
        }
    }

    pub fn ui_command(&self) -> Option<&UiCommand> {
        match self {
            Self::ApplyUi { ui_command, .. } => Some(ui_command),
            _ => None
        }
    }
}
