//! The set of configured adapters and their attempt order.

use std::sync::Arc;

use appforge_core::ForgeConfig;
use appforge_core::config::ProviderKind;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::adapter::ProviderAdapter;
use crate::{CloudflareAdapter, HttpSettings, HuggingFaceAdapter, OpenAiCompatibleAdapter};

/// Configured adapters plus the priority order used for the default chain.
#[derive(Clone, Default)]
pub struct ProviderCatalog {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    priority: Vec<String>,
}

/// Public description of one provider, served by `GET /providers`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub name: String,
    pub default_model: String,
    pub available: bool,
    /// Position in the default chain, if the provider is in it.
    pub priority: Option<usize>,
}

impl ProviderCatalog {
    /// Build HTTP adapters from config, reading API keys from the process environment.
    pub fn from_config(config: &ForgeConfig) -> Self {
        Self::from_config_with_env(config, &|name| std::env::var(name).ok())
    }

    pub fn from_config_with_env(config: &ForgeConfig, env: &dyn Fn(&str) -> Option<String>) -> Self {
        let client = Client::new();
        let adapters: Vec<Arc<dyn ProviderAdapter>> = config
            .providers
            .iter()
            .map(|p| {
                let settings = HttpSettings::resolve(p, env);
                let adapter: Arc<dyn ProviderAdapter> = match p.kind {
                    ProviderKind::OpenaiCompatible => {
                        Arc::new(OpenAiCompatibleAdapter::new(settings, client.clone()))
                    }
                    ProviderKind::Huggingface => Arc::new(HuggingFaceAdapter::new(settings, client.clone())),
                    ProviderKind::Cloudflare => Arc::new(CloudflareAdapter::new(settings, client.clone())),
                };
                adapter
            })
            .collect();

        let mut priority: Vec<String> = Vec::with_capacity(config.generation.priority.len());
        for name in &config.generation.priority {
            if config.provider(name).is_none() {
                warn!(provider = %name, "priority names an unconfigured provider, ignoring");
            }
            if priority.contains(name) {
                warn!(provider = %name, "provider listed twice in priority, keeping first position");
                continue;
            }
            priority.push(name.clone());
        }

        let catalog = Self { adapters, priority };
        info!(
            configured = catalog.adapters.len(),
            available = catalog.default_chain().len(),
            "provider catalog built"
        );
        catalog
    }

    /// Catalog whose priority is the given adapter order.
    pub fn from_adapters(adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        let priority = adapters.iter().map(|a| a.name().to_string()).collect();
        Self { adapters, priority }
    }

    /// Look up any configured adapter by name, available or not.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.iter().find(|a| a.name() == name).cloned()
    }

    /// Available adapters in priority order, each at most once.
    pub fn default_chain(&self) -> Vec<Arc<dyn ProviderAdapter>> {
        let mut chain: Vec<Arc<dyn ProviderAdapter>> = Vec::new();
        for adapter in self.priority.iter().filter_map(|name| self.get(name)) {
            if adapter.is_available() && !chain.iter().any(|a| a.name() == adapter.name()) {
                chain.push(adapter);
            }
        }
        chain
    }

    /// Every configured provider, chain members first in priority order.
    pub fn describe(&self) -> Vec<ProviderInfo> {
        let mut info: Vec<ProviderInfo> = self
            .adapters
            .iter()
            .map(|a| ProviderInfo {
                name: a.name().to_string(),
                default_model: a.default_model().to_string(),
                available: a.is_available(),
                priority: self.priority.iter().position(|p| p == a.name()),
            })
            .collect();
        info.sort_by_key(|p| p.priority.unwrap_or(usize::MAX));
        info
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(chain: &[Arc<dyn ProviderAdapter>]) -> Vec<&str> {
        chain.iter().map(|a| a.name()).collect()
    }

    #[test]
    fn chain_contains_only_providers_with_keys() {
        let config = ForgeConfig::default();
        let env = |name: &str| match name {
            "OPENAI_API_KEY" | "HUGGINGFACE_API_KEY" => Some("k".to_string()),
            _ => None,
        };
        let catalog = ProviderCatalog::from_config_with_env(&config, &env);
        assert_eq!(catalog.len(), 5);
        assert_eq!(names(&catalog.default_chain()), vec!["openai", "huggingface"]);
        assert!(catalog.get("groq").is_some());
    }

    #[test]
    fn chain_follows_priority_not_declaration_order() {
        let mut config = ForgeConfig::default();
        config.generation.priority = vec!["cloudflare".into(), "github".into(), "groq".into()];
        let env = |_: &str| Some("k".to_string());
        let catalog = ProviderCatalog::from_config_with_env(&config, &env);
        assert_eq!(names(&catalog.default_chain()), vec!["cloudflare", "github", "groq"]);
    }

    #[test]
    fn describe_reports_availability_and_priority() {
        let mut config = ForgeConfig::default();
        config.generation.priority = vec!["github".into()];
        let env = |name: &str| (name == "GITHUB_TOKEN").then(|| "t".to_string());
        let catalog = ProviderCatalog::from_config_with_env(&config, &env);
        let info = catalog.describe();
        let github = info.iter().find(|p| p.name == "github").unwrap();
        assert!(github.available);
        assert_eq!(github.priority, Some(0));
        let groq = info.iter().find(|p| p.name == "groq").unwrap();
        assert!(!groq.available);
        assert_eq!(groq.priority, None);
        assert_eq!(info[0].name, "github");
        assert_eq!(info.len(), 5);
    }

    #[test]
    fn repeated_priority_entries_appear_once() {
        let mut config = ForgeConfig::default();
        config.generation.priority = vec!["groq".into(), "openai".into(), "groq".into()];
        let env = |_: &str| Some("k".to_string());
        let catalog = ProviderCatalog::from_config_with_env(&config, &env);
        assert_eq!(names(&catalog.default_chain()), vec!["groq", "openai"]);
        let groq = catalog.describe().into_iter().find(|p| p.name == "groq").unwrap();
        assert_eq!(groq.priority, Some(0));
    }

    #[test]
    fn unknown_priority_entries_are_skipped() {
        let mut config = ForgeConfig::default();
        config.generation.priority = vec!["nope".into(), "groq".into()];
        let env = |_: &str| Some("k".to_string());
        let catalog = ProviderCatalog::from_config_with_env(&config, &env);
        assert_eq!(names(&catalog.default_chain()), vec!["groq"]);
    }
}
