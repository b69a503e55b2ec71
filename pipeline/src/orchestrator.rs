//! The phase orchestrator.
//!
//! One run walks `Assessing -> Adapting -> Judging -> SafetyChecked -> Done`,
//! leaving early on low confidence or a judge rejection. Each phase returns
//! `Result<_, PhaseError>`; an `Err` anywhere is mapped to the fallback
//! responder at the top of [`PhaseOrchestrator::process_page`].

use crate::cache::{FingerprintCache, fingerprint};
use crate::distiller::distill;
use crate::fallback::{build_mock, should_apply_bionic};
use crate::heuristics::{HeuristicGate, parse_logs};
use crate::phases::{PIPELINE_PHASES, PhaseSpec, run_phase};
use crate::safety::enforce_main_content_safety;
use crate::snapshot::build_snapshot;
use crate::telemetry::PipelineTelemetry;
use aura_core::{
    AccessibilityAssessment, CapabilityProvider, DomData, JudgeResult, PageSnapshot,
    PipelineResult, ResultMode, RiskLevel, UIAdaptationDecision, UiCommand, UserProfile
};
use config::{CacheConfig, PipelineConfig};
use errors::PhaseError;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

pub const GATE_REASON: &str = "heuristic_gate";
pub const LOW_RISK_REASON: &str = "low_risk";
pub const LOW_ASSESSMENT_REASON: &str = "low_assessment_confidence";
pub const LOW_ADAPTATION_REASON: &str = "low_adaptation_confidence";
pub const JUDGE_REJECTION_MESSAGE: &str = "The proposed adaptation was rejected during validation";

/// Intermediate states of one run. `Done` is terminal.
#[derive(Debug)]
enum State {
    Assessing,
    Adapting {
        assessment: AccessibilityAssessment
    },
    Judging {
        assessment: AccessibilityAssessment,
        adaptation: UIAdaptationDecision
    },
    SafetyChecked {
        assessment: AccessibilityAssessment,
        adaptation: UIAdaptationDecision
    },
    Done(PipelineResult)
}

struct RunContext<'a> {
    profile: &'a UserProfile,
    snapshot: PageSnapshot,
    main_selector: &'a str
}

/// Re-apply the main-content rule for the page being served. A cached result
/// may have been filtered against another page's main selector.
fn with_main_content_safety(result: PipelineResult, main_selector: &str) -> PipelineResult {
    match result {
        PipelineResult::ApplyUi {
            mode,
            mut ui_command,
            primary_goal
        } => {
            ui_command.hide_elements =
                enforce_main_content_safety(ui_command.hide_elements, main_selector);
            PipelineResult::ApplyUi {
                mode,
                ui_command,
                primary_goal
            }
        }
        other => other
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    // Phase inputs are plain data; serialization cannot fail.
    serde_json::to_string_pretty(value).unwrap_or_default()
}

pub struct PhaseOrchestrator {
    provider: Arc<dyn CapabilityProvider>,
    config: PipelineConfig,
    gate: HeuristicGate,
    assessment: PhaseSpec,
    adaptation: PhaseSpec,
    judge: PhaseSpec,
    cache: Arc<FingerprintCache<PipelineResult>>,
    telemetry: Arc<PipelineTelemetry>
}

impl PhaseOrchestrator {
    pub fn new(
        provider: Arc<dyn CapabilityProvider>,
        config: PipelineConfig,
        cache: Arc<FingerprintCache<PipelineResult>>,
        telemetry: Arc<PipelineTelemetry>
    ) -> Self {
        let retries = config.phase_retries;
        let [assessment, adaptation, judge] = PIPELINE_PHASES.map(|p| p.with_retries(retries));
        Self {
            provider,
            gate: HeuristicGate::from_config(&config.heuristics),
            assessment,
            adaptation,
            judge,
            config,
            cache,
            telemetry
        }
    }

    /// Build an orchestrator with its own result cache.
    pub fn with_cache_config(
        provider: Arc<dyn CapabilityProvider>,
        config: PipelineConfig,
        cache_config: &CacheConfig,
        telemetry: Arc<PipelineTelemetry>
    ) -> Self {
        let cache = if cache_config.enabled {
            FingerprintCache::new(
                "pipeline",
                Duration::from_secs(cache_config.pipeline_ttl_seconds),
                cache_config.max_entries,
                telemetry.clone()
            )
        } else {
            FingerprintCache::disabled("pipeline", telemetry.clone())
        };
        Self::new(provider, config, Arc::new(cache), telemetry)
    }

    pub fn cache(&self) -> &FingerprintCache<PipelineResult> {
        &self.cache
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// The model-backed phases in run order, with the configured retries.
    pub fn phases(&self) -> [&PhaseSpec; 3] {
        [&self.assessment, &self.adaptation, &self.judge]
    }

    /// Run the pipeline for one page.
    ///
    /// Always returns a well-formed result. Implicit triggers go through the
    /// heuristic gate first; explicit ones always run the phases.
    #[instrument(skip_all, fields(url = %page.url, explicit = is_explicit))]
    pub async fn process_page(
        &self,
        page: &DomData,
        profile: &UserProfile,
        logs: &[String],
        is_explicit: bool
    ) -> PipelineResult {
        let distilled = distill(page, self.config.max_elements);
        self.telemetry
            .record_distillation(distilled.summary.len(), distilled.actions.len());

        let key = match fingerprint(&distilled, Some(profile)) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(error = %e, "Could not fingerprint page; cache bypassed");
                None
            }
        };
        if let Some(cached) = key.as_deref().and_then(|k| self.cache.get(k)) {
            info!("Returning cached pipeline result");
            return self.finish(with_main_content_safety(
                cached,
                page.main_content_selector()
            ));
        }

        let snapshot = build_snapshot(page, &distilled, parse_logs(logs));
        if !is_explicit {
            let run = self.gate.should_run_ai(&snapshot);
            self.telemetry.record_gate_decision(run);
            if !run {
                info!("Heuristic gate skipped the pipeline");
                return self.finish(PipelineResult::NoAction {
                    mode: ResultMode::PhasedAgent,
                    reason: GATE_REASON.to_string()
                });
            }
        }

        let ctx = RunContext {
            profile,
            snapshot,
            main_selector: page.main_content_selector()
        };
        let result = match self.run_phases(&ctx).await {
            Ok(result) => {
                if let Some(key) = key {
                    self.cache.set(key, result.clone());
                }
                result
            }
            Err(e) => {
                error!(
                    url = %page.url,
                    phase = e.phase(),
                    kind = %e.kind(),
                    error = %e,
                    "Pipeline phase failed; using fallback response"
                );
                self.telemetry.record_fallback(e.phase());
                build_mock(page, &distilled, profile, self.config.fallback_hide_count)
            }
        };
        self.finish(result)
    }

    fn finish(&self, result: PipelineResult) -> PipelineResult {
        self.telemetry
            .record_outcome(result.action(), &result.mode().to_string());
        result
    }

    async fn run_phases(&self, ctx: &RunContext<'_>) -> Result<PipelineResult, PhaseError> {
        let mut state = State::Assessing;
        loop {
            state = match state {
                State::Assessing => {
                    let assessment = self.assess(ctx).await?;
                    self.after_assessment(assessment)
                }
                State::Adapting { assessment } => {
                    let adaptation = self.adapt(ctx, &assessment).await?;
                    self.after_adaptation(assessment, adaptation)
                }
                State::Judging {
                    assessment,
                    adaptation
                } => {
                    let judge = self.judge(ctx, &adaptation).await?;
                    self.after_judge(assessment, adaptation, judge)
                }
                State::SafetyChecked {
                    assessment,
                    adaptation
                } => State::Done(self.apply_ui(ctx, assessment, adaptation)),
                State::Done(result) => return Ok(result)
            };
        }
    }

    async fn assess(&self, ctx: &RunContext<'_>) -> Result<AccessibilityAssessment, PhaseError> {
        let input = format!(
            "Page snapshot:\n{}\n\nUser profile:\n{}",
            to_json(&ctx.snapshot),
            to_json(ctx.profile)
        );
        run_phase(self.provider.as_ref(), &self.assessment, &input, &[], &self.telemetry).await
    }

    async fn adapt(
        &self,
        ctx: &RunContext<'_>,
        assessment: &AccessibilityAssessment
    ) -> Result<UIAdaptationDecision, PhaseError> {
        let language = if ctx.profile.prefers_simple_language() {
            "simple: short sentences, no jargon"
        } else {
            "detailed: comprehensive summary"
        };
        let input = format!(
            "Page snapshot:\n{}\n\nAssessment:\n{}\n\nUser profile:\n{}\n\n\
             Language level: {language}\n\
             Primary content container (never hide): {}",
            to_json(&ctx.snapshot),
            to_json(assessment),
            to_json(ctx.profile),
            ctx.main_selector
        );
        run_phase(self.provider.as_ref(), &self.adaptation, &input, &[], &self.telemetry).await
    }

    async fn judge(
        &self,
        ctx: &RunContext<'_>,
        adaptation: &UIAdaptationDecision
    ) -> Result<JudgeResult, PhaseError> {
        let input = format!(
            "Before:\n{}\n\nProposed adaptation:\n{}\n\nPrimary content container: {}",
            ctx.snapshot.dom_text,
            to_json(adaptation),
            ctx.main_selector
        );
        run_phase(self.provider.as_ref(), &self.judge, &input, &[], &self.telemetry).await
    }

    fn after_assessment(&self, assessment: AccessibilityAssessment) -> State {
        let low_risk = assessment.risk_level == RiskLevel::Low;
        if low_risk || assessment.confidence < self.config.assessment_confidence_threshold {
            let reason = if low_risk {
                LOW_RISK_REASON
            } else {
                LOW_ASSESSMENT_REASON
            };
            info!(
                reason,
                confidence = assessment.confidence,
                "Assessment below threshold; suggesting help"
            );
            return State::Done(PipelineResult::SuggestHelp {
                mode: ResultMode::PhasedAgent,
                reason: reason.to_string(),
                explanation: None,
                confidence: assessment.confidence
            });
        }
        State::Adapting { assessment }
    }

    fn after_adaptation(
        &self,
        assessment: AccessibilityAssessment,
        adaptation: UIAdaptationDecision
    ) -> State {
        if adaptation.confidence < self.config.adaptation_confidence_threshold {
            info!(
                confidence = adaptation.confidence,
                "Adaptation below threshold; suggesting help"
            );
            return State::Done(PipelineResult::SuggestHelp {
                mode: ResultMode::PhasedAgent,
                reason: LOW_ADAPTATION_REASON.to_string(),
                confidence: adaptation.confidence,
                explanation: Some(adaptation.explanation)
            });
        }
        State::Judging {
            assessment,
            adaptation
        }
    }

    fn after_judge(
        &self,
        assessment: AccessibilityAssessment,
        adaptation: UIAdaptationDecision,
        judge: JudgeResult
    ) -> State {
        if !judge.success {
            info!(reasons = ?judge.reasons, "Judge rejected the adaptation");
            return State::Done(PipelineResult::Warn {
                mode: ResultMode::PhasedAgent,
                message: JUDGE_REJECTION_MESSAGE.to_string(),
                reasons: judge.reasons
            });
        }
        State::SafetyChecked {
            assessment,
            adaptation
        }
    }

    fn apply_ui(
        &self,
        ctx: &RunContext<'_>,
        assessment: AccessibilityAssessment,
        adaptation: UIAdaptationDecision
    ) -> PipelineResult {
        let visual_validation_required = assessment.complexity_score
            > self.config.visual_complexity_threshold
            || adaptation.confidence < self.config.visual_confidence_threshold;

        PipelineResult::ApplyUi {
            mode: ResultMode::PhasedAgent,
            ui_command: UiCommand {
                layout_mode: adaptation.layout_mode,
                theme: adaptation.theme,
                hide_elements: enforce_main_content_safety(
                    adaptation.hide_elements,
                    ctx.main_selector
                ),
                highlight_elements: adaptation.highlight_elements,
                explanation: adaptation.explanation,
                visual_validation_required,
                bionic_reading: should_apply_bionic(ctx.profile)
            },
            primary_goal: Some(assessment.primary_goal)
        }
    }
}
