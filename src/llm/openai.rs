use serde::Deserialize;

use crate::llm::client::{GenerationSettings, LlmClientTrait, LlmError, RetryPolicy, retry_with_backoff};

/// Synchronous client for OpenAI-compatible chat completion endpoints.
///
/// Construct it with [`LlmClientBuilder`](crate::llm::LlmClientBuilder).
pub struct OpenAiClient {
    pub(crate) client: reqwest::blocking::Client,
    pub(crate) api_url: String,
    pub(crate) api_key: String,
    pub(crate) retry: RetryPolicy,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

impl OpenAiClient {
    /// Returns the chat completions URL configured for this client.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// Request body: one user message carrying the whole prompt.
pub(crate) fn request_body(prompt: &str, settings: &GenerationSettings) -> serde_json::Value {
    serde_json::json!({
        "model": settings.model,
        "temperature": settings.temperature,
        "max_tokens": settings.max_output_tokens,
        "messages": [
            {"role": "user", "content": prompt}
        ]
    })
}

/// Pulls `choices[0].message.content` out of a chat completion body.
pub(crate) fn parse_response(body: &str) -> Result<String, LlmError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(LlmError::Serialization)?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::Api {
            message: "Model returned no choices".to_string(),
        })
}

impl LlmClientTrait for OpenAiClient {
    fn generate(&self, prompt: &str, settings: &GenerationSettings) -> Result<String, LlmError> {
        debug_assert!(settings.validate().is_ok(), "invalid generation settings");

        let body = request_body(prompt, settings);

        retry_with_backoff(&self.retry, || {
            let response = self
                .client
                .post(&self.api_url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .map_err(LlmError::from_reqwest)?;

            let status = response.status();
            let text = response.text().map_err(LlmError::from_reqwest)?;

            if !status.is_success() {
                tracing::error!(status = status.as_u16(), body = %text, "OpenAI API error");
                return Err(LlmError::Http {
                    status: status.as_u16(),
                });
            }

            parse_response(&text)
        })
    }
}
