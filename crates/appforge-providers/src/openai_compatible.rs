//! Adapter for OpenAI-style chat completion APIs (Groq, OpenAI, GitHub Models).

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapter::{ProviderAdapter, ProviderOutput, ProviderRequest};
use crate::error::ProviderFailure;
use crate::{HttpSettings, SYSTEM_PROMPT};

pub struct OpenAiCompatibleAdapter {
    settings: HttpSettings,
    client: Client,
}

impl OpenAiCompatibleAdapter {
    pub fn new(settings: HttpSettings, client: Client) -> Self {
        Self { settings, client }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
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
struct ChatResponse {
    choices: Vec<Choice>,
    model: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatibleAdapter {
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
        let url = format!("{}/chat/completions", self.settings.endpoint.trim_end_matches('/'));

        let body = ChatRequest {
            model,
            messages: vec![
                Message { role: "system", content: SYSTEM_PROMPT },
                Message { role: "user", content: &request.prompt },
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let start = Instant::now();
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

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderFailure::from_reqwest(e, request.timeout))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderFailure::MalformedResponse("no choices[0].message.content".into()))?;

        debug!(
            provider = %self.settings.name,
            model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = content.len(),
            "chat completion received"
        );

        Ok(ProviderOutput {
            content,
            model: parsed.model.unwrap_or_else(|| model.to_string()),
        })
    }
}
