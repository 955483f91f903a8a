//! Adapter for Cloudflare Workers AI.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapter::{ProviderAdapter, ProviderOutput, ProviderRequest};
use crate::error::ProviderFailure;
use crate::{HttpSettings, SYSTEM_PROMPT};

pub struct CloudflareAdapter {
    settings: HttpSettings,
    client: Client,
}

impl CloudflareAdapter {
    /// `settings.endpoint` must already have `{account_id}` substituted.
    pub fn new(settings: HttpSettings, client: Client) -> Self {
        Self { settings, client }
    }
}

#[derive(Serialize)]
struct RunRequest<'a> {
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct RunResponse {
    success: bool,
    result: Option<RunResult>,
}

#[derive(Deserialize)]
struct RunResult {
    response: String,
}

#[async_trait]
impl ProviderAdapter for CloudflareAdapter {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn default_model(&self) -> &str {
        &self.settings.model
    }

    fn is_available(&self) -> bool {
        self.settings.api_key.is_some() && !self.settings.endpoint.contains("{account_id}")
    }

    async fn attempt(&self, request: &ProviderRequest) -> Result<ProviderOutput, ProviderFailure> {
        if self.settings.endpoint.contains("{account_id}") {
            return Err(ProviderFailure::Unavailable("account id not configured".into()));
        }
        let api_key = self.settings.require_key()?;
        let model = request.model.as_deref().unwrap_or(&self.settings.model);
        let url = format!("{}/{model}", self.settings.endpoint.trim_end_matches('/'));

        let body = RunRequest {
            messages: vec![
                Message { role: "system", content: SYSTEM_PROMPT },
                Message { role: "user", content: &request.prompt },
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderFailure::from_reqwest(e, request.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderFailure::status(status.as_u16(), &text));
        }

        let parsed: RunResponse = response
            .json()
            .await
            .map_err(|e| ProviderFailure::from_reqwest(e, request.timeout))?;

        if !parsed.success {
            return Err(ProviderFailure::MalformedResponse("success = false".into()));
        }
        let content = parsed
            .result
            .map(|r| r.response)
            .ok_or_else(|| ProviderFailure::MalformedResponse("missing result".into()))?;

        debug!(provider = %self.settings.name, model, chars = content.len(), "workers ai response received");

        Ok(ProviderOutput {
            content,
            model: model.to_string(),
        })
    }
}
