use metrics::{counter, gauge, histogram};

/// Metric emission for the pipeline. Recorders are installed by the host.
#[derive(Debug, Default)]
pub struct PipelineTelemetry {
    _phantom: std::marker::PhantomData<()>
}

impl PipelineTelemetry {
    pub fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData
        }
    }

    pub fn record_outcome(&self, action: &str, mode: &str) {
        let labels = [("action", action.to_string()), ("mode", mode.to_string())];
        counter!("aura_pipeline_results_total", &labels).increment(1);
    }

    pub fn record_gate_decision(&self, run: bool) {
        counter!("aura_heuristic_gate_total",
            "decision" => if run { "run" } else { "skip" }
        )
        .increment(1);
    }

    pub fn record_phase_success(&self, phase: &str, duration_ms: f64, attempts: u32) {
        let labels = [("phase", phase.to_string()), ("status", "success".to_string())];
        counter!("aura_phase_runs_total", &labels).increment(1);

        histogram!("aura_phase_duration_seconds", "phase" => phase.to_string())
            .record(duration_ms / 1000.0);
        histogram!("aura_phase_attempts", "phase" => phase.to_string()).record(attempts as f64);
    }

    pub fn record_phase_failure(&self, phase: &str, kind: &str) {
        let labels = [
            ("phase", phase.to_string()),
            ("status", "failure".to_string()),
            ("kind", kind.to_string())
        ];
        counter!("aura_phase_runs_total", &labels).increment(1);
    }

    pub fn record_fallback(&self, phase: &str) {
        counter!("aura_fallback_total", "phase" => phase.to_string()).increment(1);
    }

    pub fn record_cache_hit(&self, cache: &str) {
        counter!("aura_cache_hits_total", "cache" => cache.to_string()).increment(1);
    }

    pub fn record_cache_miss(&self, cache: &str) {
        counter!("aura_cache_misses_total", "cache" => cache.to_string()).increment(1);
    }

    pub fn record_cache_size(&self, cache: &str, entries: usize) {
        gauge!("aura_cache_entries", "cache" => cache.to_string()).set(entries as f64);
    }

    pub fn record_provider_call(&self, provider: &str, operation: &str) {
        let labels = [
            ("provider", provider.to_string()),
            ("operation", operation.to_string())
        ];
        counter!("aura_provider_calls_total", &labels).increment(1);
    }

    pub fn record_distillation(&self, summary: usize, actions: usize) {
        histogram!("aura_distilled_elements", "list" => "summary").record(summary as f64);
        histogram!("aura_distilled_elements", "list" => "actions").record(actions as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_util::debugging::DebuggingRecorder;

    #[test]
    fn test_metrics_recording() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            let telemetry = PipelineTelemetry::new();

            telemetry.record_outcome("apply_ui", "phased_agent");
            telemetry.record_gate_decision(false);
            telemetry.record_phase_success("assessment", 120.0, 1);
            telemetry.record_phase_failure("judge", "malformed_output");
            telemetry.record_fallback("assessment");
            telemetry.record_cache_hit("pipeline");
            telemetry.record_cache_miss("explanation");
            telemetry.record_cache_size("pipeline", 3);
            telemetry.record_provider_call("mock", "generate");
            telemetry.record_distillation(4, 2);
        });

        let snapshot = snapshotter.snapshot().into_vec();
        assert!(!snapshot.is_empty(), "Expected metrics to be recorded");
        assert!(
            snapshot
                .iter()
                .any(|(key, _, _, _)| key.key().name() == "aura_pipeline_results_total")
        );
    }
}
