//! appforge.toml configuration parser.
//!
//! Every section is optional; anything missing falls back to the defaults
//! below, which include the five built-in providers.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForgeConfig {
    pub server: ServerConfig,
    pub generation: GenerationConfig,
    pub registry: RegistryConfig,
    pub providers: Vec<ProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    /// Base of the `url` handed back for each deployment.
    pub public_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Per-provider attempt timeout.
    pub provider_timeout_secs: u64,
    /// Provider names in the order they are tried.
    pub priority: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Maximum length of the most-recent-first deployment index.
    pub index_capacity: usize,
    /// Characters of artifact kept in metadata previews.
    pub preview_chars: usize,
}

/// Wire protocol spoken by a provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// `POST {endpoint}/chat/completions` (Groq, OpenAI, GitHub Models).
    OpenaiCompatible,
    /// `POST {endpoint}/{model}` with `inputs`.
    Huggingface,
    /// `POST {endpoint}/{model}` on Workers AI.
    Cloudflare,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Cloudflare only: environment variable holding the account id,
    /// substituted for `{account_id}` in the endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id_env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8787,
            data_dir: PathBuf::from("/var/lib/appforge"),
            public_base_url: "http://localhost:8787".to_string(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider_timeout_secs: 30,
            priority: ["groq", "openai", "github", "huggingface", "cloudflare"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            index_capacity: 1000,
            preview_chars: 500,
        }
    }
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            generation: GenerationConfig::default(),
            registry: RegistryConfig::default(),
            providers: default_providers(),
        }
    }
}

fn provider(name: &str, kind: ProviderKind, endpoint: &str, model: &str, key_env: &str) -> ProviderConfig {
    ProviderConfig {
        name: name.to_string(),
        kind,
        endpoint: endpoint.to_string(),
        model: model.to_string(),
        api_key_env: key_env.to_string(),
        account_id_env: None,
        max_tokens: Some(4096),
        temperature: Some(0.7),
    }
}

/// Built-in provider table.
pub fn default_providers() -> Vec<ProviderConfig> {
    let mut cloudflare = provider(
        "cloudflare",
        ProviderKind::Cloudflare,
        "https://api.cloudflare.com/client/v4/accounts/{account_id}/ai/run",
        "@cf/meta/llama-3.1-8b-instruct",
        "CLOUDFLARE_API_TOKEN",
    );
    cloudflare.account_id_env = Some("CLOUDFLARE_ACCOUNT_ID".to_string());

    vec![
        provider(
            "groq",
            ProviderKind::OpenaiCompatible,
            "https://api.groq.com/openai/v1",
            "llama-3.1-70b-versatile",
            "GROQ_API_KEY",
        ),
        provider(
            "openai",
            ProviderKind::OpenaiCompatible,
            "https://api.openai.com/v1",
            "gpt-4o-mini",
            "OPENAI_API_KEY",
        ),
        provider(
            "github",
            ProviderKind::OpenaiCompatible,
            "https://models.inference.ai.azure.com",
            "gpt-4o-mini",
            "GITHUB_TOKEN",
        ),
        provider(
            "huggingface",
            ProviderKind::Huggingface,
            "https://api-inference.huggingface.co/models",
            "mistralai/Mixtral-8x7B-Instruct-v0.1",
            "HUGGINGFACE_API_KEY",
        ),
        cloudflare,
    ]
}

impl ForgeConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ForgeConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the daemon cannot honor as written.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.registry.index_capacity == 0 {
            anyhow::bail!("registry.index_capacity must be at least 1");
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.generation.provider_timeout_secs)
    }

    /// Look up a provider definition by name.
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let config = ForgeConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("groq"));
        assert!(toml_str.contains("openai-compatible"));
        let parsed: ForgeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.generation, config.generation);
        assert_eq!(parsed.registry, config.registry);
        assert_eq!(parsed.providers.len(), 5);
        assert_eq!(
            parsed.provider("cloudflare").unwrap().account_id_env.as_deref(),
            Some("CLOUDFLARE_ACCOUNT_ID")
        );
    }

    #[test]
    fn test_parse_partial() {
        let toml_str = r#"
[server]
port = 9000

[registry]
index_capacity = 5
"#;
        let config: ForgeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.public_base_url, "http://localhost:8787");
        assert_eq!(config.registry.index_capacity, 5);
        assert_eq!(config.registry.preview_chars, 500);
        assert_eq!(config.generation.priority.len(), 5);
        assert_eq!(config.providers.len(), 5);
    }

    #[test]
    fn test_parse_custom_provider() {
        let toml_str = r#"
[generation]
priority = ["local"]
provider_timeout_secs = 5

[[providers]]
name = "local"
kind = "openai-compatible"
endpoint = "http://127.0.0.1:11434/v1"
model = "qwen2.5-coder"
api_key_env = "LOCAL_KEY"
"#;
        let config: ForgeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.providers.len(), 1);
        let local = config.provider("local").unwrap();
        assert_eq!(local.kind, ProviderKind::OpenaiCompatible);
        assert_eq!(local.max_tokens, None);
        assert_eq!(config.provider_timeout(), Duration::from_secs(5));
        assert!(config.provider("groq").is_none());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appforge.toml");
        std::fs::write(&path, "[server]\nport = 1234\n").unwrap();
        let config = ForgeConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 1234);
    }

    #[test]
    fn test_zero_index_capacity_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appforge.toml");
        std::fs::write(&path, "[registry]\nindex_capacity = 0\n").unwrap();
        let err = ForgeConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("index_capacity"));

        assert!(ForgeConfig::default().validate().is_ok());
    }
}
