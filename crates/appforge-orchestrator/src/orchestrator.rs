//! The fallback orchestrator.

use std::sync::Arc;
use std::time::{Duration, Instant};

use appforge_analytics::AnalyticsAggregator;
use appforge_core::{Artifact, Deployment, GenerationMethod, deployment_url, new_deployment_id, validate};
use appforge_providers::{ProviderAdapter, ProviderCatalog, ProviderFailure, ProviderOutput, ProviderRequest};
use appforge_state::StateStore;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::GenerateError;
use crate::prompt::enhance_prompt;

const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_BASE_URL: &str = "http://localhost:8787";

/// One generation request as received from a client.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Try only this provider instead of the default chain.
    pub provider: Option<String>,
    /// Model passed to every attempted provider.
    pub model: Option<String>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }
}

/// Artifact chosen for a deployment plus where it came from.
struct Produced {
    artifact: Artifact,
    method: GenerationMethod,
    provider: Option<String>,
    model: Option<String>,
}

/// Runs the provider chain and persists the result.
#[derive(Clone)]
pub struct Orchestrator {
    catalog: ProviderCatalog,
    state: StateStore,
    analytics: AnalyticsAggregator,
    provider_timeout: Duration,
    public_base_url: String,
}

impl Orchestrator {
    pub fn new(catalog: ProviderCatalog, state: StateStore, analytics: AnalyticsAggregator) -> Self {
        Self {
            catalog,
            state,
            analytics,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            public_base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Upper bound for each provider attempt.
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Base of the `url` recorded on each deployment.
    pub fn with_public_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.public_base_url = base_url.into();
        self
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    /// Generate and persist a deployment.
    pub async fn generate(&self, request: GenerateRequest) -> Result<Deployment, GenerateError> {
        self.generate_with_cancel(request, &CancellationToken::new()).await
    }

    /// Like [`generate`](Self::generate), but stops as soon as `cancel` fires.
    ///
    /// A cancelled generation stores nothing and records no analytics.
    pub async fn generate_with_cancel(
        &self,
        request: GenerateRequest,
        cancel: &CancellationToken,
    ) -> Result<Deployment, GenerateError> {
        if request.prompt.trim().is_empty() {
            return Err(GenerateError::Validation("prompt must not be empty".to_string()));
        }

        let started = Instant::now();
        let enhanced = enhance_prompt(&request.prompt);
        let candidates = self.candidates(request.provider.as_deref());

        let mut produced = None;
        for adapter in candidates {
            if cancel.is_cancelled() {
                return Err(GenerateError::Cancelled);
            }
            let attempt = ProviderRequest {
                prompt: enhanced.clone(),
                model: request.model.clone(),
                timeout: self.provider_timeout,
            };
            match self.attempt(adapter.as_ref(), &attempt, cancel).await {
                Ok(output) => match validate(&output.content) {
                    Ok(artifact) => {
                        produced = Some(Produced {
                            artifact,
                            method: GenerationMethod::Provider(adapter.name().to_string()),
                            provider: Some(adapter.name().to_string()),
                            model: Some(output.model),
                        });
                        break;
                    }
                    Err(reason) => {
                        warn!(provider = adapter.name(), %reason, "provider output rejected");
                    }
                },
                Err(ProviderFailure::Cancelled) => return Err(GenerateError::Cancelled),
                Err(failure) => {
                    warn!(
                        provider = adapter.name(),
                        kind = failure.kind(),
                        error = %failure,
                        "provider attempt failed"
                    );
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(GenerateError::Cancelled);
        }

        let produced = produced.unwrap_or_else(|| {
            info!("all providers failed, using template fallback");
            Produced {
                artifact: appforge_templates::fallback(&request.prompt),
                method: GenerationMethod::TemplateFallback,
                provider: None,
                model: None,
            }
        });

        let id = new_deployment_id();
        let deployment = Deployment {
            url: deployment_url(&self.public_base_url, &id),
            id,
            prompt: request.prompt,
            artifact: produced.artifact.into_string(),
            method: produced.method,
            provider: produced.provider,
            model: produced.model,
            generation_duration_ms: started.elapsed().as_millis() as u64,
            created_at: Utc::now(),
        };

        self.state.create_deployment(&deployment)?;
        self.analytics.record_event(
            deployment.provider.as_deref(),
            &deployment.method,
            deployment.generation_duration_ms,
        );

        info!(
            id = %deployment.id,
            method = %deployment.method,
            duration_ms = deployment.generation_duration_ms,
            "deployment created"
        );
        Ok(deployment)
    }

    /// Providers to try, in order.
    ///
    /// An explicit provider is the only candidate; if it is unknown or
    /// unavailable the list is empty and generation goes straight to the
    /// template fallback.
    fn candidates(&self, requested: Option<&str>) -> Vec<Arc<dyn ProviderAdapter>> {
        match requested {
            Some(name) => match self.catalog.get(name) {
                Some(adapter) if adapter.is_available() => vec![adapter],
                Some(_) => {
                    warn!(provider = name, "requested provider is unavailable");
                    Vec::new()
                }
                None => {
                    warn!(provider = name, "requested provider is not configured");
                    Vec::new()
                }
            },
            None => self.catalog.default_chain(),
        }
    }

    /// One attempt, bounded by the provider timeout and raced against `cancel`.
    async fn attempt(
        &self,
        adapter: &dyn ProviderAdapter,
        request: &ProviderRequest,
        cancel: &CancellationToken,
    ) -> Result<ProviderOutput, ProviderFailure> {
        debug!(provider = adapter.name(), "attempting provider");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderFailure::Cancelled),
            result = tokio::time::timeout(request.timeout, adapter.attempt(request)) => {
                result.unwrap_or(Err(ProviderFailure::Timeout(request.timeout)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use appforge_providers::{ScriptedAdapter, ScriptedOutcome};

    const PAGE: &str = "<!DOCTYPE html><html><body>from provider</body></html>";

    struct Harness {
        orchestrator: Orchestrator,
        state: StateStore,
        analytics: AnalyticsAggregator,
    }

    fn harness(adapters: Vec<Arc<ScriptedAdapter>>) -> Harness {
        harness_with_capacity(adapters, 1000)
    }

    fn harness_with_capacity(adapters: Vec<Arc<ScriptedAdapter>>, capacity: usize) -> Harness {
        let state = StateStore::open_in_memory().unwrap().with_index_capacity(capacity);
        let analytics = AnalyticsAggregator::new(state.clone());
        let adapters = adapters
            .into_iter()
            .map(|a| a as Arc<dyn ProviderAdapter>)
            .collect();
        let orchestrator = Orchestrator::new(ProviderCatalog::from_adapters(adapters), state.clone(), analytics.clone())
            .with_provider_timeout(Duration::from_millis(200))
            .with_public_base_url("https://forge.test/");
        Harness {
            orchestrator,
            state,
            analytics,
        }
    }

    #[tokio::test]
    async fn all_providers_fail_falls_back_to_template() {
        let a = Arc::new(ScriptedAdapter::failing("a"));
        let b = Arc::new(ScriptedAdapter::always(
            "b",
            ScriptedOutcome::Fail(ProviderFailure::Status {
                code: 500,
                body: "boom".into(),
            }),
        ));
        let h = harness(vec![a.clone(), b.clone()]);

        let d = h.orchestrator.generate(GenerateRequest::new("make a clock")).await.unwrap();
        assert_eq!(d.method, GenerationMethod::TemplateFallback);
        assert_eq!(d.provider, None);
        assert_eq!(d.model, None);
        assert!(validate(&d.artifact).is_ok());
        assert_eq!((a.calls(), b.calls()), (1, 1));

        let summary = h.analytics.summary().unwrap();
        assert_eq!(summary.counts_by_method["template-fallback"], 1);
        assert_eq!(summary.counts_by_provider["template"], 1);
    }

    #[tokio::test]
    async fn repeated_provider_is_attempted_once() {
        let a = Arc::new(ScriptedAdapter::failing("a"));
        let h = harness(vec![a.clone(), a.clone()]);

        let d = h.orchestrator.generate(GenerateRequest::new("make a clock")).await.unwrap();
        assert_eq!(d.method, GenerationMethod::TemplateFallback);
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn first_success_stops_the_chain() {
        let a = Arc::new(ScriptedAdapter::responding("a", PAGE));
        let b = Arc::new(ScriptedAdapter::responding("b", PAGE));
        let h = harness(vec![a.clone(), b.clone()]);

        let d = h.orchestrator.generate(GenerateRequest::new("anything")).await.unwrap();
        assert_eq!(d.method.to_string(), "a-ai");
        assert_eq!(d.provider.as_deref(), Some("a"));
        assert_eq!(d.model.as_deref(), Some("scripted-1"));
        assert_eq!(d.artifact, PAGE);
        assert_eq!((a.calls(), b.calls()), (1, 0));
    }

    #[tokio::test]
    async fn later_provider_used_after_failures() {
        let a = Arc::new(ScriptedAdapter::failing("a"));
        let b = Arc::new(ScriptedAdapter::responding("b", format!("```html\n{PAGE}\n```")));
        let c = Arc::new(ScriptedAdapter::responding("c", PAGE));
        let h = harness(vec![a.clone(), b.clone(), c.clone()]);

        let d = h.orchestrator.generate(GenerateRequest::new("x")).await.unwrap();
        assert_eq!(d.provider.as_deref(), Some("b"));
        // Fences are stripped before storage.
        assert_eq!(d.artifact, PAGE);
        assert_eq!(c.calls(), 0);
    }

    #[tokio::test]
    async fn invalid_output_moves_to_next_provider() {
        let empty = Arc::new(ScriptedAdapter::responding("empty", ""));
        let prose = Arc::new(ScriptedAdapter::responding("prose", "Sorry, I can't do that."));
        let h = harness(vec![empty.clone(), prose.clone()]);

        let d = h.orchestrator.generate(GenerateRequest::new("a timer")).await.unwrap();
        assert_eq!(d.method, GenerationMethod::TemplateFallback);
        assert_eq!((empty.calls(), prose.calls()), (1, 1));
    }

    #[tokio::test]
    async fn unavailable_providers_are_skipped() {
        let off = Arc::new(ScriptedAdapter::responding("off", PAGE).unavailable());
        let on = Arc::new(ScriptedAdapter::responding("on", PAGE));
        let h = harness(vec![off.clone(), on.clone()]);

        let d = h.orchestrator.generate(GenerateRequest::new("x")).await.unwrap();
        assert_eq!(d.provider.as_deref(), Some("on"));
        assert_eq!(off.calls(), 0);
    }

    #[tokio::test]
    async fn failing_override_tries_no_other_provider() {
        let a = Arc::new(ScriptedAdapter::responding("a", PAGE));
        let x = Arc::new(ScriptedAdapter::failing("x"));
        let h = harness(vec![a.clone(), x.clone()]);

        let request = GenerateRequest {
            provider: Some("x".to_string()),
            ..GenerateRequest::new("a counter")
        };
        let d = h.orchestrator.generate(request).await.unwrap();
        assert_eq!(d.method, GenerationMethod::TemplateFallback);
        assert_eq!((a.calls(), x.calls()), (0, 1));
    }

    #[tokio::test]
    async fn unknown_override_goes_straight_to_fallback() {
        let a = Arc::new(ScriptedAdapter::responding("a", PAGE));
        let h = harness(vec![a.clone()]);

        let request = GenerateRequest {
            provider: Some("nope".to_string()),
            ..GenerateRequest::new("hello")
        };
        let d = h.orchestrator.generate(request).await.unwrap();
        assert_eq!(d.method, GenerationMethod::TemplateFallback);
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn model_override_reaches_provider_and_record() {
        let a = Arc::new(ScriptedAdapter::responding("a", PAGE));
        let h = harness(vec![a.clone()]);

        let request = GenerateRequest {
            model: Some("big-model".to_string()),
            ..GenerateRequest::new("x")
        };
        let d = h.orchestrator.generate(request).await.unwrap();
        assert_eq!(d.model.as_deref(), Some("big-model"));
    }

    #[tokio::test]
    async fn providers_receive_enhanced_prompt() {
        let a = Arc::new(ScriptedAdapter::responding("a", PAGE));
        let h = harness(vec![a.clone()]);

        let d = h.orchestrator.generate(GenerateRequest::new("a pomodoro timer")).await.unwrap();
        assert_eq!(d.prompt, "a pomodoro timer");
        assert_eq!(a.prompts(), vec![enhance_prompt("a pomodoro timer")]);
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected_without_side_effects() {
        let a = Arc::new(ScriptedAdapter::responding("a", PAGE));
        let h = harness(vec![a.clone()]);

        for prompt in ["", "   \n\t"] {
            let err = h.orchestrator.generate(GenerateRequest::new(prompt)).await.unwrap_err();
            assert!(matches!(err, GenerateError::Validation(_)));
        }
        assert_eq!(a.calls(), 0);
        assert!(h.state.index().unwrap().is_empty());
        assert_eq!(h.analytics.summary().unwrap().total_deployments, 0);
    }

    #[tokio::test]
    async fn deployment_is_persisted_and_indexed() {
        let h = harness(vec![Arc::new(ScriptedAdapter::responding("a", PAGE))]);

        let d = h.orchestrator.generate(GenerateRequest::new("x")).await.unwrap();
        assert_eq!(d.url, format!("https://forge.test/deployments/{}", d.id));
        assert_eq!(h.state.get_deployment(&d.id).unwrap().unwrap(), d);
        assert_eq!(h.state.index().unwrap().to_vec(), vec![d.id.clone()]);
        assert_eq!(h.analytics.summary().unwrap().counts_by_method["a-ai"], 1);
    }

    #[tokio::test]
    async fn ids_are_pairwise_distinct() {
        let h = harness(Vec::new());
        let mut ids = HashSet::new();
        for i in 0..1000 {
            let d = h.orchestrator.generate(GenerateRequest::new(format!("app {i}"))).await.unwrap();
            ids.insert(d.id);
        }
        assert_eq!(ids.len(), 1000);
    }

    #[tokio::test]
    async fn index_is_bounded_with_fifo_eviction() {
        let h = harness_with_capacity(Vec::new(), 5);
        let mut created = Vec::new();
        for i in 0..8 {
            let d = h.orchestrator.generate(GenerateRequest::new(format!("app {i}"))).await.unwrap();
            created.push(d.id);
        }

        let index = h.state.index().unwrap().to_vec();
        let expected: Vec<String> = created.iter().rev().take(5).cloned().collect();
        assert_eq!(index, expected);
        assert_eq!(h.analytics.summary().unwrap().total_deployments, 8);
    }

    #[tokio::test]
    async fn calculator_prompt_falls_back_to_calculator_template() {
        let h = harness(vec![Arc::new(ScriptedAdapter::failing("a"))]);

        let d = h
            .orchestrator
            .generate(GenerateRequest::new("Build me a simple calculator"))
            .await
            .unwrap();
        assert_eq!(d.method, GenerationMethod::TemplateFallback);
        assert!(d.artifact.starts_with("<!DOCTYPE html>"));
        assert!(d.artifact.ends_with("</html>"));
        for digit in 0..10 {
            assert!(d.artifact.contains(&format!("data-digit=\"{digit}\"")));
        }
        assert!(d.artifact.contains("data-action=\"equals\""));
        assert!(d.artifact.contains("data-action=\"clear\""));
    }

    #[tokio::test]
    async fn hanging_provider_times_out_and_chain_continues() {
        let slow = Arc::new(ScriptedAdapter::always("slow", ScriptedOutcome::Hang));
        let fast = Arc::new(ScriptedAdapter::responding("fast", PAGE));
        let h = harness(vec![slow.clone(), fast.clone()]);

        let d = h.orchestrator.generate(GenerateRequest::new("x")).await.unwrap();
        assert_eq!(d.provider.as_deref(), Some("fast"));
        assert_eq!(slow.calls(), 1);
    }

    #[tokio::test]
    async fn cancellation_stops_generation_without_persisting() {
        let slow = Arc::new(ScriptedAdapter::always("slow", ScriptedOutcome::Hang));
        let next = Arc::new(ScriptedAdapter::responding("next", PAGE));
        let h = harness(vec![slow.clone(), next.clone()]);
        let orchestrator = h.orchestrator.clone().with_provider_timeout(Duration::from_secs(60));

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = orchestrator
            .generate_with_cancel(GenerateRequest::new("x"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::Cancelled));
        assert_eq!(next.calls(), 0);
        assert!(h.state.index().unwrap().is_empty());
        assert_eq!(h.analytics.summary().unwrap().total_deployments, 0);
    }

    #[tokio::test]
    async fn already_cancelled_token_attempts_nothing() {
        let a = Arc::new(ScriptedAdapter::responding("a", PAGE));
        let h = harness(vec![a.clone()]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = h
            .orchestrator
            .generate_with_cancel(GenerateRequest::new("x"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::Cancelled));
        assert_eq!(a.calls(), 0);
    }
}
