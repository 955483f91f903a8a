//! Analytics aggregator — durable counters over created deployments.

use appforge_core::{AnalyticsSummary, GenerationMethod};
use appforge_state::{StateResult, StateStore};
use chrono::Utc;
use tracing::{debug, warn};

/// Records deployment events into the shared [`AnalyticsSummary`].
#[derive(Clone)]
pub struct AnalyticsAggregator {
    state: StateStore,
}

impl AnalyticsAggregator {
    pub fn new(state: StateStore) -> Self {
        Self { state }
    }

    /// Count one deployment. `provider` is `None` for template fallbacks.
    ///
    /// Best-effort: a store failure is logged and dropped so it never fails
    /// the generation that triggered it.
    pub fn record_event(&self, provider: Option<&str>, method: &GenerationMethod, duration_ms: u64) {
        let result = self
            .state
            .update_analytics(|summary| summary.apply(provider, method, duration_ms, Utc::now()));
        match result {
            Ok(summary) => debug!(
                total = summary.total_deployments,
                %method,
                duration_ms,
                "analytics event recorded"
            ),
            Err(e) => warn!(error = %e, %method, "failed to record analytics event"),
        }
    }

    /// Current aggregate counters.
    pub fn summary(&self) -> StateResult<AnalyticsSummary> {
        self.state.analytics_summary()
    }
}
