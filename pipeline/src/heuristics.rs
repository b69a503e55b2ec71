//! Cheap, deterministic gate deciding whether a background trigger is worth
//! the model calls.

use aura_core::PageSnapshot;
use aura_core::page::{IDLE_TIME, RAGE_CLICKS, SCROLL_LOOPS};
use config::HeuristicsConfig;
use std::collections::BTreeMap;

/// Idle time recorded for each log entry mentioning `idle`.
pub const IDLE_LOG_SECONDS: f64 = 15.0;

#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicGate {
    idle_time_seconds: f64,
    structure_chars: usize
}

impl Default for HeuristicGate {
    fn default() -> Self {
        Self::from_config(&HeuristicsConfig::default())
    }
}

impl HeuristicGate {
    pub fn from_config(config: &HeuristicsConfig) -> Self {
        Self {
            idle_time_seconds: config.idle_time_seconds,
            structure_chars: config.structure_chars
        }
    }

    /// True when any interaction signal or the page size suggests difficulty.
    pub fn should_run_ai(&self, snapshot: &PageSnapshot) -> bool {
        snapshot.stat(IDLE_TIME) > self.idle_time_seconds
            || snapshot.stat(SCROLL_LOOPS) > 0.0
            || snapshot.stat(RAGE_CLICKS) > 0.0
            || snapshot.structure_size() > self.structure_chars
    }
}

/// Gate with the default thresholds.
pub fn should_run_ai(snapshot: &PageSnapshot) -> bool {
    HeuristicGate::default().should_run_ai(snapshot)
}

/// Turn free-form interaction log entries into interaction stats.
///
/// Entries are matched case-insensitively; one entry may feed several
/// signals. Absent signals are reported as zero.
pub fn parse_logs<S: AsRef<str>>(logs: &[S]) -> BTreeMap<String, f64> {
    let mut idle_time: f64 = 0.0;
    let mut scroll_loops = 0.0;
    let mut rage_clicks = 0.0;

    for entry in logs {
        let entry = entry.as_ref().to_lowercase();
        if entry.contains("idle") {
            idle_time = idle_time.max(IDLE_LOG_SECONDS);
        }
        if entry.contains("scroll") {
            scroll_loops += 1.0;
        }
        if entry.contains("click") {
            rage_clicks += 1.0;
        }
    }

    BTreeMap::from([
        (IDLE_TIME.to_string(), idle_time),
        (SCROLL_LOOPS.to_string(), scroll_loops),
        (RAGE_CLICKS.to_string(), rage_clicks)
    ])
}
