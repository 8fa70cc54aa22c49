//! Completion Provider client — one chat-completion call per generation.
//!
//! Failure is reported as data, not control flow: `generate()` always
//! returns a displayable string, embedding the error text on failure, so
//! the presentation layer never needs a catch path. The finer-grained
//! [`CompletionError`] taxonomy exists for logging and tests.

use serde::{Deserialize, Serialize};

use crate::prompt::ChatMessage;

/// Prefix of the failure-as-data string returned by [`CompletionClient::generate`].
pub const GENERATION_ERROR_PREFIX: &str = "Error generating note: ";

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("{0}")]
    Transport(String),
    #[error("Completion provider returned HTTP {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

/// Request body for `/v1/chat/completions`.
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

pub struct CompletionClient {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl CompletionClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature,
            max_tokens,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        Self::new(
            &config.openai_base_url,
            &config.openai_api_key,
            &config.model,
            config.temperature,
            config.max_tokens,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One synchronous completion call. Every failure mode is folded
    /// into a renderable string so the caller always has something to
    /// display.
    pub async fn generate(&self, messages: &[ChatMessage]) -> String {
        match self.try_generate(messages).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, model = %self.model, "note generation failed");
                format!("{GENERATION_ERROR_PREFIX}{e}")
            }
        }
    }

    async fn try_generate(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| CompletionError::Malformed("response contained no choices".into()))
    }
}
