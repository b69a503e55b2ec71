//! User capability profile.
//!
//! The profile is an immutable input to every phase. It is loaded once per
//! request from a [`crate::ProfileStore`] and never mutated by the pipeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    EnumString,
    Display
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SupportLevel {
    #[default]
    None,
    Low,
    Medium,
    High
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum PrecisionTier {
    #[default]
    Normal,
    Limited,
    Severe
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum VisionAcuity {
    #[default]
    Normal,
    Low,
    Blind
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InputChannel {
    Text,
    Speech,
    Vision
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutputChannel {
    Visual,
    Auditory,
    Haptic
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct CognitiveProfile {
    #[serde(default)]
    pub support_level: SupportLevel,
    #[serde(default = "default_true")]
    pub simplify_language: bool,
    #[serde(default = "default_true")]
    pub reduce_distractions: bool,
    #[serde(default)]
    pub memory_aids: bool
}

impl Default for CognitiveProfile {
    fn default() -> Self {
        Self {
            support_level: SupportLevel::None,
            simplify_language: true,
            reduce_distractions: true,
            memory_aids: false
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct MotorProfile {
    #[serde(default)]
    pub precision_required: PrecisionTier,
    #[serde(default)]
    pub click_assistance: bool,
    #[serde(default)]
    pub keyboard_only: bool,
    #[serde(default)]
    pub target_upscaling: bool
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct SensoryProfile {
    #[serde(default)]
    pub vision_acuity: VisionAcuity,
    #[serde(default)]
    pub color_blindness: Option<String>,
    #[serde(default)]
    pub audio_sensitivity: bool,
    #[serde(default)]
    pub high_contrast: bool
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ModalityPreferences {
    #[serde(default = "default_input_channels")]
    pub input_preferred: Vec<InputChannel>,
    #[serde(default = "default_output_channels")]
    pub output_preferred: Vec<OutputChannel>,
    #[serde(default)]
    pub auto_tts: bool
}

impl Default for ModalityPreferences {
    fn default() -> Self {
        Self {
            input_preferred: default_input_channels(),
            output_preferred: default_output_channels(),
            auto_tts: false
        }
    }
}

/// Nested capability record identified by an opaque `aura_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct UserProfile {
    pub aura_id: String,
    #[serde(default)]
    pub cognitive: CognitiveProfile,
    #[serde(default)]
    pub motor: MotorProfile,
    #[serde(default)]
    pub sensory: SensoryProfile,
    #[serde(default)]
    pub modalities: ModalityPreferences
}

impl UserProfile {
    pub fn new(aura_id: impl Into<String>) -> Self {
        Self {
            aura_id: aura_id.into(),
            cognitive: CognitiveProfile::default(),
            motor: MotorProfile::default(),
            sensory: SensoryProfile::default(),
            modalities: ModalityPreferences::default()
        }
    }

    /// Short sentences and no jargon, as opposed to a comprehensive summary.
    pub fn prefers_simple_language(&self) -> bool {
        self.cognitive.simplify_language
    }

    pub fn needs_cognitive_support(&self) -> bool {
        self.cognitive.support_level != SupportLevel::None || self.cognitive.reduce_distractions
    }

    pub fn needs_high_contrast(&self) -> bool {
        self.sensory.high_contrast || self.sensory.vision_acuity != VisionAcuity::Normal
    }
}

/// Whether an adaptation was helpful, as reported by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub aura_id: String,
    pub url: String,
    pub helpful: bool,
    #[serde(default)]
    pub comment: Option<String>
}

fn default_true() -> bool {
    true
}

fn default_input_channels() -> Vec<InputChannel> {
    vec![InputChannel::Text]
}

fn default_output_channels() -> Vec<OutputChannel> {
    vec![OutputChannel::Visual]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_profile_defaults_from_minimal_json() {
        let profile: UserProfile = serde_json::from_str(r#"{"aura_id": "guest-1"}"#).unwrap();

        assert_eq!(profile.aura_id, "guest-1");
        assert_eq!(profile.cognitive.support_level, SupportLevel::None);
        assert!(profile.cognitive.simplify_language);
        assert!(profile.cognitive.reduce_distractions);
        assert_eq!(profile.motor.precision_required, PrecisionTier::Normal);
        assert_eq!(profile.modalities.input_preferred, vec![InputChannel::Text]);
    }

    #[test]
    fn test_profile_full_json() {
        let json = r#"{
            "aura_id": "test-user",
            "cognitive": {"support_level": "medium", "simplify_language": false, "reduce_distractions": true, "memory_aids": false},
            "motor": {"precision_required": "severe", "click_assistance": true, "keyboard_only": false, "target_upscaling": false},
            "sensory": {"vision_acuity": "low", "color_blindness": null, "audio_sensitivity": false, "high_contrast": false},
            "modalities": {"input_preferred": ["text", "speech"], "output_preferred": ["auditory"], "auto_tts": true}
        }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();

        assert_eq!(profile.cognitive.support_level, SupportLevel::Medium);
        assert!(!profile.prefers_simple_language());
        assert_eq!(profile.motor.precision_required, PrecisionTier::Severe);
        assert!(profile.needs_high_contrast());
        assert_eq!(
            profile.modalities.output_preferred,
            vec![OutputChannel::Auditory]
        );
    }

    #[test]
    fn test_support_level_parsing() {
        assert_eq!(SupportLevel::from_str("high").unwrap(), SupportLevel::High);
        assert_eq!(SupportLevel::Low.to_string(), "low");
        assert!(SupportLevel::from_str("extreme").is_err());
    }

    #[test]
    fn test_needs_cognitive_support() {
        let mut profile = UserProfile::new("u");
        profile.cognitive.reduce_distractions = false;
        assert!(!profile.needs_cognitive_support());

        profile.cognitive.support_level = SupportLevel::Low;
        assert!(profile.needs_cognitive_support());
    }
}
