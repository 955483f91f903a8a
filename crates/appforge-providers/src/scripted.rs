//! In-process adapter that replays scripted outcomes and counts calls.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::adapter::{ProviderAdapter, ProviderOutput, ProviderRequest};
use crate::error::ProviderFailure;

#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Return this text as the raw provider output.
    Respond(String),
    Fail(ProviderFailure),
    /// Never complete; only a timeout or cancellation ends the attempt.
    Hang,
}

pub struct ScriptedAdapter {
    name: String,
    available: bool,
    queue: Mutex<VecDeque<ScriptedOutcome>>,
    fallback: ScriptedOutcome,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedAdapter {
    /// Adapter that returns `outcome` on every call.
    pub fn always(name: impl Into<String>, outcome: ScriptedOutcome) -> Self {
        Self {
            name: name.into(),
            available: true,
            queue: Mutex::new(VecDeque::new()),
            fallback: outcome,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn responding(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::always(name, ScriptedOutcome::Respond(content.into()))
    }

    pub fn failing(name: impl Into<String>) -> Self {
        Self::always(
            name,
            ScriptedOutcome::Fail(ProviderFailure::Transport("connection refused".into())),
        )
    }

    /// Queue outcomes consumed before the default one.
    pub fn then(self, outcome: ScriptedOutcome) -> Self {
        self.queue.lock().unwrap().push_back(outcome);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        "scripted-1"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn attempt(&self, request: &ProviderRequest) -> Result<ProviderOutput, ProviderFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let outcome = self
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match outcome {
            ScriptedOutcome::Respond(content) => Ok(ProviderOutput {
                content,
                model: request.model.clone().unwrap_or_else(|| self.default_model().to_string()),
            }),
            ScriptedOutcome::Fail(failure) => Err(failure),
            ScriptedOutcome::Hang => std::future::pending().await,
        }
    }
}
