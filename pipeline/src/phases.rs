//! Phase specifications and the generic structured-output runner.
//!
//! Every inference phase is the same shape: instructions, an input rendered
//! as text, and an output type with a JSON Schema. The orchestrator walks an
//! ordered list of [`PhaseSpec`]s and calls [`run_phase`] for each.

use crate::telemetry::PipelineTelemetry;
use aura_core::{CapabilityProvider, ImageAttachment};
use errors::PhaseError;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use std::time::Instant;
use tracing::{debug, warn};
use validator::Validate;

/// Instructions and retry budget for one inference phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSpec {
    pub name: &'static str,
    pub instructions: &'static str,
    /// Total attempts allowed for output failures. Zero behaves as one.
    pub retries: u32
}

impl PhaseSpec {
    pub fn with_retries(self, retries: u32) -> Self {
        Self { retries, ..self }
    }

    fn attempts(&self) -> u32 {
        self.retries.max(1)
    }
}

pub const ASSESSMENT: PhaseSpec = PhaseSpec {
    name: "assessment",
    instructions: "You are an information distillation agent for accessibility. \
        Read the page snapshot and summarize WHAT the page is about and what the user \
        is most likely trying to do there. Separate the MAIN CONTENT from UI CLUTTER \
        (navigation, ads, banners, repeated links). Rate the accessibility risk for this \
        user, list concrete issues, score visual and cognitive complexity from 1 to 10 \
        and report how confident you are between 0 and 1.",
    retries: 3
};

pub const ADAPTATION: PhaseSpec = PhaseSpec {
    name: "adaptation",
    instructions: "You are a UI adaptation agent. Using the snapshot, the assessment and \
        the user profile, propose structural changes that make the page easier for this \
        user. The explanation must summarize the page content for the user and respect \
        their language level. Use a dark or contrast theme only when the profile asks for \
        it. NEVER hide the primary content container; hide only secondary noise such as \
        navigation, ads and sidebars. Highlight the controls that serve the primary goal. \
        Report how confident you are between 0 and 1.",
    retries: 3
};

pub const JUDGE: PhaseSpec = PhaseSpec {
    name: "judge",
    instructions: "You are an Accessibility Judge. Compare the page before the change with \
        the proposed adaptation and decide whether applying it is safe. Reject proposals \
        that introduce regressions or safety issues: hiding primary content, removing the \
        controls the user needs, or an explanation that misrepresents the page. Give the \
        reasons for any rejection and your confidence between 0 and 1.",
    retries: 3
};

pub const VISION: PhaseSpec = PhaseSpec {
    name: "vision",
    instructions: "You are a visual accessibility verifier. Look at the screenshot of the \
        adapted page and judge Readability, Visual Integrity and Goal Achievement for the \
        stated user goal. Score the improvement between 0 and 1, list any new issues the \
        adaptation introduced and recommend keep, refine or rollback.",
    retries: 2
};

/// The model-backed phases in the order the orchestrator runs them.
pub const PIPELINE_PHASES: [PhaseSpec; 3] = [ASSESSMENT, ADAPTATION, JUDGE];

/// Render the full prompt for one attempt.
pub fn build_prompt<O: JsonSchema>(spec: &PhaseSpec, input: &str, rejection: Option<&str>) -> String {
    let schema = schemars::schema_for!(O);
    let schema = serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string());

    let mut prompt = format!(
        "Phase: {name}\n\n{instructions}\n\n\
         Respond ONLY with a JSON object matching this JSON Schema:\n{schema}\n\n\
         Input:\n{input}\n",
        name = spec.name,
        instructions = spec.instructions
    );
    if let Some(reason) = rejection {
        prompt.push_str(&format!(
            "\nYour previous answer was rejected: {reason}\nReply again with valid JSON only.\n"
        ));
    }
    prompt
}

/// Decode and validate one model answer.
///
/// Syntax errors are malformed output; well-formed JSON with wrong fields,
/// types or out-of-range values is a schema violation.
pub fn decode_output<O>(phase: &str, raw: &str) -> Result<O, PhaseError>
where
    O: DeserializeOwned + Validate
{
    let body = utils::strip_code_fences(raw);
    let output: O = serde_json::from_str(body).map_err(|e| {
        if e.is_data() {
            PhaseError::SchemaViolation {
                phase: phase.to_string(),
                reason: e.to_string()
            }
        } else {
            PhaseError::MalformedOutput {
                phase: phase.to_string(),
                reason: e.to_string()
            }
        }
    })?;

    output.validate().map_err(|e| PhaseError::SchemaViolation {
        phase: phase.to_string(),
        reason: e.to_string()
    })?;
    Ok(output)
}

/// Run one phase against the provider.
///
/// Output failures are re-prompted with the rejection reason until the
/// phase's attempts run out. Provider failures end the phase immediately.
/// When `images` is non-empty the call goes through the image capability.
pub async fn run_phase<O>(
    provider: &dyn CapabilityProvider,
    spec: &PhaseSpec,
    input: &str,
    images: &[ImageAttachment],
    telemetry: &PipelineTelemetry
) -> Result<O, PhaseError>
where
    O: DeserializeOwned + JsonSchema + Validate
{
    let started = Instant::now();
    let attempts = spec.attempts();
    let mut rejection: Option<String> = None;
    let mut last_error: Option<PhaseError> = None;

    for attempt in 1..=attempts {
        let prompt = build_prompt::<O>(spec, input, rejection.as_deref());
        telemetry.record_provider_call(provider.name(), spec.name);

        let reply = if images.is_empty() {
            provider.generate(&prompt).await
        } else {
            provider.generate_with_images(&prompt, images).await
        };
        let generation = match reply {
            Ok(generation) => generation,
            Err(source) => {
                telemetry.record_phase_failure(spec.name, "provider");
                return Err(PhaseError::Provider {
                    phase: spec.name.to_string(),
                    source
                });
            }
        };

        match decode_output::<O>(spec.name, &generation.content) {
            Ok(output) => {
                debug!(phase = spec.name, attempt, "Phase completed");
                telemetry.record_phase_success(
                    spec.name,
                    started.elapsed().as_secs_f64() * 1000.0,
                    attempt
                );
                return Ok(output);
            }
            Err(e) => {
                warn!(phase = spec.name, attempt, error = %e, "Phase output rejected");
                telemetry.record_phase_failure(spec.name, &e.kind().to_string());
                rejection = Some(e.to_string());
                last_error = Some(e);
            }
        }
    }

    let last = last_error.unwrap_or_else(|| PhaseError::MalformedOutput {
        phase: spec.name.to_string(),
        reason: "no attempt was made".to_string()
    });
    if attempts == 1 {
        return Err(last);
    }
    Err(PhaseError::RetriesExhausted {
        phase: spec.name.to_string(),
        attempts,
        last: Box::new(last)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_core::{AccessibilityAssessment, JudgeResult, RiskLevel};
    use errors::{PhaseFailureKind, ProviderError};
    use providers::{MockProvider, MockReply};

    const ASSESSMENT_JSON: &str = r#"{"risk_level": "high", "issues": ["dense nav"], "complexity_score": 6, "primary_goal": "Read article", "confidence": 0.9}"#;

    #[test]
    fn test_prompt_carries_phase_schema_and_input() {
        let prompt = build_prompt::<JudgeResult>(&JUDGE, "Before: page", None);
        assert!(prompt.starts_with("Phase: judge"));
        assert!(prompt.contains("Accessibility Judge"));
        assert!(prompt.contains("\"success\""));
        assert!(prompt.contains("Before: page"));
        assert!(!prompt.contains("previous answer"));

        let retry = build_prompt::<JudgeResult>(&JUDGE, "x", Some("missing field"));
        assert!(retry.contains("rejected: missing field"));
    }

    #[test]
    fn test_decode_strips_fences() {
        let raw = format!("Here you go:\n```json\n{ASSESSMENT_JSON}\n```");
        let assessment: AccessibilityAssessment = decode_output("assessment", &raw).unwrap();
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(assessment.complexity_score, 6);
    }

    #[test]
    fn test_decode_classifies_failures() {
        let err = decode_output::<JudgeResult>("judge", "not json at all").unwrap_err();
        assert_eq!(err.kind(), PhaseFailureKind::MalformedOutput);

        let err = decode_output::<JudgeResult>("judge", r#"{"confidence": 0.5}"#).unwrap_err();
        assert_eq!(err.kind(), PhaseFailureKind::SchemaViolation);

        let err = decode_output::<JudgeResult>("judge", r#"{"success": true, "confidence": 1.5}"#)
            .unwrap_err();
        assert_eq!(err.kind(), PhaseFailureKind::SchemaViolation);
        assert_eq!(err.phase(), "judge");
    }

    #[tokio::test]
    async fn test_run_phase_retries_output_failures() {
        let provider = MockProvider::new().with_replies(
            "Phase: assessment",
            vec![MockReply::from("garbage"), MockReply::from(ASSESSMENT_JSON)]
        );
        let telemetry = PipelineTelemetry::new();

        let assessment: AccessibilityAssessment =
            run_phase(&provider, &ASSESSMENT, "snapshot", &[], &telemetry)
                .await
                .unwrap();

        assert_eq!(assessment.primary_goal, "Read article");
        let calls = provider.calls().await;
        assert_eq!(calls.len(), 2);
        assert!(calls[1].contains("previous answer was rejected"));
    }

    #[tokio::test]
    async fn test_run_phase_gives_up_after_retries() {
        let provider = MockProvider::new().with_reply("Phase: judge", "{}");
        let telemetry = PipelineTelemetry::new();

        let err = run_phase::<JudgeResult>(&provider, &JUDGE.with_retries(2), "x", &[], &telemetry)
            .await
            .unwrap_err();

        assert!(matches!(err, PhaseError::RetriesExhausted { attempts: 2, .. }));
        assert_eq!(err.kind(), PhaseFailureKind::SchemaViolation);
        assert_eq!(provider.call_count().await, 2);
    }

    #[tokio::test]
    async fn test_run_phase_never_retries_provider_failures() {
        let provider = MockProvider::new().with_failure(
            "Phase: assessment",
            ProviderError::transport("mock", "connection refused")
        );
        let telemetry = PipelineTelemetry::new();

        let err = run_phase::<AccessibilityAssessment>(&provider, &ASSESSMENT, "x", &[], &telemetry)
            .await
            .unwrap_err();

        assert!(matches!(err, PhaseError::Provider { .. }));
        assert_eq!(provider.call_count().await, 1);
    }
}
