//! Process-wide composition of the pipeline components.

use crate::distiller::distill;
use crate::explainer::Explainer;
use crate::orchestrator::PhaseOrchestrator;
use crate::session::SessionStore;
use crate::telemetry::PipelineTelemetry;
use crate::vision::{VerificationRequest, VisualVerifier};
use aura_core::{CapabilityProvider, DomData, PipelineResult, UserProfile, VisionVerdict};
use config::Config;
use std::sync::Arc;
use tracing::info;

/// Owns the orchestrator, explainer, verifier and session store.
///
/// Built once at startup from the loaded configuration; caches and sessions
/// live as long as the runtime and are only cleared on request.
pub struct AuraRuntime {
    pub orchestrator: PhaseOrchestrator,
    pub explainer: Explainer,
    pub verifier: VisualVerifier,
    pub sessions: Arc<SessionStore>,
    max_elements: usize
}

impl AuraRuntime {
    pub fn new(provider: Arc<dyn CapabilityProvider>, config: &Config) -> Self {
        let telemetry = Arc::new(PipelineTelemetry::new());
        let pipeline = config.pipeline.clone();
        info!(
            provider = provider.name(),
            cache_enabled = config.cache.enabled,
            "Aura runtime initialized"
        );

        Self {
            explainer: Explainer::with_cache_config(
                provider.clone(),
                pipeline.max_elements,
                &config.cache,
                telemetry.clone()
            ),
            verifier: VisualVerifier::new(
                provider.clone(),
                pipeline.vision_retries,
                telemetry.clone()
            ),
            max_elements: pipeline.max_elements,
            orchestrator: PhaseOrchestrator::with_cache_config(
                provider,
                pipeline,
                &config.cache,
                telemetry
            ),
            sessions: Arc::new(SessionStore::new())
        }
    }

    pub async fn process_page(
        &self,
        page: &DomData,
        profile: &UserProfile,
        logs: &[String],
        is_explicit: bool
    ) -> PipelineResult {
        self.orchestrator
            .process_page(page, profile, logs, is_explicit)
            .await
    }

    /// Run the pipeline and record the exchange in a session.
    pub async fn process_in_session(
        &self,
        session_id: &str,
        page: &DomData,
        profile: &UserProfile,
        logs: &[String],
        is_explicit: bool
    ) -> PipelineResult {
        let distilled = distill(page, self.max_elements);
        let dom_summary = page
            .content_summary
            .clone()
            .unwrap_or_else(|| distilled.title.clone());
        self.sessions
            .get_session(session_id)
            .update_context(page.url.clone(), dom_summary);

        let result = self.process_page(page, profile, logs, is_explicit).await;

        let note = match &result {
            PipelineResult::ApplyUi { ui_command, .. } => ui_command.explanation.clone(),
            PipelineResult::SuggestHelp { reason, .. } | PipelineResult::NoAction { reason, .. } => {
                format!("{}: {reason}", result.action())
            }
            PipelineResult::Warn { message, .. } => message.clone()
        };
        self.sessions
            .get_session(session_id)
            .add_message("assistant", note);
        result
    }

    pub async fn verify_adaptation(&self, request: &VerificationRequest) -> VisionVerdict {
        self.verifier.verify_adaptation(request).await
    }

    /// Drop every cached result and explanation.
    pub fn clear_caches(&self) {
        self.orchestrator.clear_cache();
        self.explainer.cache().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_core::DomElement;
    use providers::MockProvider;

    #[tokio::test]
    async fn test_session_records_page_and_result() {
        let runtime = AuraRuntime::new(Arc::new(MockProvider::new()), &Config::default());
        let page = DomData {
            title: "Quiet Page".to_string(),
            url: "https://quiet.test".to_string(),
            elements: vec![DomElement::new("text", "Nothing to see")],
            main_selector: None,
            content_summary: None
        };

        let result = runtime
            .process_in_session("tab-1", &page, &UserProfile::new("u"), &[], false)
            .await;

        assert_eq!(result.action(), "none");
        let session = runtime.sessions.snapshot("tab-1").unwrap();
        assert_eq!(session.current_url.as_deref(), Some("https://quiet.test"));
        assert_eq!(session.dom_summary.as_deref(), Some("Quiet Page"));
        assert_eq!(session.history[0].content, "none: heuristic_gate");
    }
}
