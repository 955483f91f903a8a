//! The provider adapter abstraction.
//!
//! The orchestrator only sees `dyn ProviderAdapter`. Each implementation
//! owns its request construction and response parsing, applies the
//! per-call timeout, and reports every problem as a [`ProviderFailure`].

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ProviderFailure;

/// One generation attempt.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// The enhanced prompt (instruction preamble plus the user's request).
    pub prompt: String,
    /// Model override; the adapter's default model is used when `None`.
    pub model: Option<String>,
    /// Upper bound for the whole HTTP exchange.
    pub timeout: Duration,
}

/// Raw text returned by a provider, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOutput {
    pub content: String,
    /// Model that actually served the request.
    pub model: String,
}

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable provider name, e.g. `groq`. Forms the `<name>-ai` method label.
    fn name(&self) -> &str;

    fn default_model(&self) -> &str;

    /// Whether credentials are configured. Unavailable adapters are skipped
    /// from the default chain.
    fn is_available(&self) -> bool {
        true
    }

    async fn attempt(&self, request: &ProviderRequest) -> Result<ProviderOutput, ProviderFailure>;
}
