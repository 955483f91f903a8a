//! Adapter for the Hugging Face Inference API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapter::{ProviderAdapter, ProviderOutput, ProviderRequest};
use crate::error::ProviderFailure;
use crate::{HttpSettings, SYSTEM_PROMPT};

pub struct HuggingFaceAdapter {
    settings: HttpSettings,
    client: Client,
}

impl HuggingFaceAdapter {
    pub fn new(settings: HttpSettings, client: Client) -> Self {
        Self { settings, client }
    }
}

#[derive(Serialize)]
struct InferenceRequest {
    inputs: String,
    parameters: Parameters,
}

#[derive(Serialize)]
struct Parameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_new_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    return_full_text: bool,
}

#[derive(Deserialize)]
struct Generated {
    generated_text: String,
}

#[async_trait]
impl ProviderAdapter for HuggingFaceAdapter {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn default_model(&self) -> &str {
        &self.settings.model
    }

    fn is_available(&self) -> bool {
        self.settings.api_key.is_some()
    }

    async fn attempt(&self, request: &ProviderRequest) -> Result<ProviderOutput, ProviderFailure> {
        let api_key = self.settings.require_key()?;
        let model = request.model.as_deref().unwrap_or(&self.settings.model);
        let url = format!("{}/{model}", self.settings.endpoint.trim_end_matches('/'));

        let body = InferenceRequest {
            inputs: format!("{SYSTEM_PROMPT}\n\n{}", request.prompt),
            parameters: Parameters {
                max_new_tokens: self.settings.max_tokens,
                temperature: self.settings.temperature,
                return_full_text: false,
            },
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

        let generated: Vec<Generated> = response
            .json()
            .await
            .map_err(|e| ProviderFailure::from_reqwest(e, request.timeout))?;

        let content = generated
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or_else(|| ProviderFailure::MalformedResponse("empty generation list".into()))?;

        debug!(provider = %self.settings.name, model, chars = content.len(), "inference received");

        Ok(ProviderOutput {
            content,
            model: model.to_string(),
        })
    }
}
