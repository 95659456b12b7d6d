use crate::llm::client::{GenerationSettings, LlmClientTrait, LlmError, RetryPolicy, retry_with_backoff};

/// Synchronous client for the Ollama `/api/generate` endpoint.
///
/// Construct it with [`LlmClientBuilder`](crate::llm::LlmClientBuilder).
pub struct OllamaClient {
    pub(crate) client: reqwest::blocking::Client,
    pub(crate) base_url: String,
    pub(crate) retry: RetryPolicy,
}

impl OllamaClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Lists available models from the Ollama API, sorted by size (largest first).
    pub fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().map_err(LlmError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(LlmError::Http {
                status: response.status().as_u16(),
            });
        }

        let json: serde_json::Value = response.json().map_err(LlmError::from_reqwest)?;

        let mut models: Vec<(String, u64)> = json
            .get("models")
            .and_then(|m| m.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|model| {
                        let name = model.get("name").and_then(|n| n.as_str())?;
                        let size = model.get("size").and_then(|s| s.as_u64()).unwrap_or(0);
                        Some((name.to_string(), size))
                    })
                    .collect()
            })
            .unwrap_or_default();

        models.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(models.into_iter().map(|(name, _)| name).collect())
    }
}

/// Request body for `/api/generate`.
pub(crate) fn request_body(prompt: &str, settings: &GenerationSettings) -> serde_json::Value {
    serde_json::json!({
        "model": settings.model,
        "prompt": prompt,
        "stream": false,
        "options": {
            "temperature": settings.temperature,
            "num_predict": settings.max_output_tokens
        }
    })
}

/// Pulls the generated text out of an `/api/generate` response body.
pub(crate) fn parse_response(body: &str) -> Result<String, LlmError> {
    let json: serde_json::Value = serde_json::from_str(body).map_err(LlmError::Serialization)?;

    json.get("response")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| LlmError::Api {
            message: "Missing 'response' field in API response".to_string(),
        })
}

impl LlmClientTrait for OllamaClient {
    fn generate(&self, prompt: &str, settings: &GenerationSettings) -> Result<String, LlmError> {
        debug_assert!(settings.validate().is_ok(), "invalid generation settings");

        let url = format!("{}/api/generate", self.base_url);
        let body = request_body(prompt, settings);

        retry_with_backoff(&self.retry, || {
            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .map_err(LlmError::from_reqwest)?;

            let status = response.status();
            let text = response.text().map_err(LlmError::from_reqwest)?;

            if !status.is_success() {
                tracing::error!(status = status.as_u16(), body = %text, "Ollama API error");
                return Err(LlmError::Http {
                    status: status.as_u16(),
                });
            }

            parse_response(&text)
        })
    }
}
