//! appforge-providers — external generation backends behind one trait.
//!
//! Every backend is wrapped in a [`ProviderAdapter`] that turns a prompt
//! into raw text or a [`ProviderFailure`]. The [`ProviderCatalog`] holds the
//! configured adapters and yields the default attempt chain in priority
//! order.
//!
//! # Adapters
//!
//! | Kind | Adapter | Endpoint |
//! |---|---|---|
//! | `openai-compatible` | [`OpenAiCompatibleAdapter`] | `POST {endpoint}/chat/completions` |
//! | `huggingface` | [`HuggingFaceAdapter`] | `POST {endpoint}/{model}` |
//! | `cloudflare` | [`CloudflareAdapter`] | `POST {endpoint}/{model}` |

pub mod adapter;
pub mod catalog;
pub mod cloudflare;
pub mod error;
pub mod huggingface;
pub mod openai_compatible;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;
#[cfg(test)]
mod test_server;

pub use adapter::{ProviderAdapter, ProviderOutput, ProviderRequest};
pub use catalog::{ProviderCatalog, ProviderInfo};
pub use cloudflare::CloudflareAdapter;
pub use error::ProviderFailure;
pub use huggingface::HuggingFaceAdapter;
pub use openai_compatible::OpenAiCompatibleAdapter;
#[cfg(any(test, feature = "testing"))]
pub use scripted::{ScriptedAdapter, ScriptedOutcome};

use appforge_core::config::ProviderConfig;

/// System instruction sent alongside every prompt.
pub const SYSTEM_PROMPT: &str = "You are an expert front-end engineer. \
Reply with exactly one complete, self-contained HTML document and nothing else.";

/// Connection details shared by the HTTP adapters.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub name: String,
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl HttpSettings {
    /// Resolve a provider definition, reading secrets through `env`.
    pub fn resolve(config: &ProviderConfig, env: &dyn Fn(&str) -> Option<String>) -> Self {
        let api_key = env(&config.api_key_env).filter(|k| !k.trim().is_empty());
        let endpoint = match config.account_id_env.as_deref().and_then(env) {
            Some(account) if !account.trim().is_empty() => {
                config.endpoint.replace("{account_id}", account.trim())
            }
            _ => config.endpoint.clone(),
        };
        Self {
            name: config.name.clone(),
            endpoint,
            model: config.model.clone(),
            api_key,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    pub(crate) fn require_key(&self) -> Result<&str, ProviderFailure> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ProviderFailure::Unavailable(format!("{} has no API key", self.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appforge_core::config::default_providers;

    #[test]
    fn resolve_reads_key_and_account() {
        let providers = default_providers();
        let cloudflare = providers.iter().find(|p| p.name == "cloudflare").unwrap();
        let env = |name: &str| match name {
            "CLOUDFLARE_API_TOKEN" => Some("token".to_string()),
            "CLOUDFLARE_ACCOUNT_ID" => Some("acct42".to_string()),
            _ => None,
        };
        let settings = HttpSettings::resolve(cloudflare, &env);
        assert_eq!(settings.api_key.as_deref(), Some("token"));
        assert_eq!(
            settings.endpoint,
            "https://api.cloudflare.com/client/v4/accounts/acct42/ai/run"
        );
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let providers = default_providers();
        let env = |_: &str| Some("   ".to_string());
        let settings = HttpSettings::resolve(&providers[0], &env);
        assert!(settings.api_key.is_none());
        assert!(settings.require_key().is_err());
    }
}
