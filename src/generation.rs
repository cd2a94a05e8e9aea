//! Hosted chat-model backend.
//!
//! [`OpenAIChat`] implements [`AnswerGenerator`] over the OpenAI-compatible
//! `POST /v1/chat/completions` endpoint. Requests are non-streaming, use
//! `temperature = 0`, and carry exactly one system and one user message.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use faq_relay_core::generation::{build_messages, AnswerGenerator};
use faq_relay_core::RelayError;

use crate::config::{require_env, GenerationConfig, OPENAI_API_KEY_VAR};

const OPENAI_DEFAULT_URL: &str = "https://api.openai.com";

pub struct OpenAIChat {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAIChat {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = require_env(OPENAI_API_KEY_VAR)?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &GenerationConfig, api_key: String) -> Result<Self> {
        let base = config.url.as_deref().unwrap_or(OPENAI_DEFAULT_URL);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/v1/chat/completions", base.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[async_trait]
impl AnswerGenerator for OpenAIChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        system_instruction: &str,
        question: &str,
    ) -> Result<String, RelayError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": build_messages(system_instruction, question),
            "temperature": 0,
            "stream": false,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(RelayError::generation)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RelayError::GenerationService(format!(
                "chat completion error {}: {}",
                status, text
            )));
        }

        let payload: CompletionResponse = response.json().await.map_err(|e| {
            RelayError::GenerationService(format!("malformed chat completion: {}", e))
        })?;

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| RelayError::generation("chat completion contained no message content"))
    }
}

/// Create the configured [`AnswerGenerator`].
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn AnswerGenerator>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIChat::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}
