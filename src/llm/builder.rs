use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::llm::client::{LlmClientTrait, LlmError, RetryPolicy};
use crate::llm::{OllamaClient, OpenAiClient};

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
/// Default OpenAI chat completions endpoint.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Which model API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    OpenAi,
    Ollama,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(LlmError::InvalidSettings(format!("unknown provider: {other}"))),
        }
    }
}

/// Builder for model clients.
///
/// Every setting resolves in the same order: the value given to the builder,
/// then an environment variable, then a default.
///
/// | Setting  | Environment variable                    | Default |
/// |----------|-----------------------------------------|---------|
/// | provider | `LABELSMITH_PROVIDER`                   | `openai` |
/// | base URL | `OLLAMA_HOST` / `OPENAI_API_URL`        | [`DEFAULT_OLLAMA_URL`] / [`DEFAULT_OPENAI_URL`] |
/// | API key  | `OPENAI_API_KEY` (OpenAI only)          | none |
///
/// # Examples
///
/// ```
/// use labelsmith::llm::{LlmClientBuilder, Provider};
///
/// let client = LlmClientBuilder::new()
///     .provider(Provider::Ollama)
///     .base_url("http://localhost:11434")
///     .build_ollama()
///     .expect("Failed to create client");
/// assert_eq!(client.base_url(), "http://localhost:11434");
/// ```
#[derive(Debug, Default)]
pub struct LlmClientBuilder {
    provider: Option<Provider>,
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
}

impl LlmClientBuilder {
    /// Creates a new `LlmClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Sets the endpoint: the Ollama base URL, or the full chat completions URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overall request timeout (default 60s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Connection timeout (default 5s).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Resolves the provider from the builder or `LABELSMITH_PROVIDER`.
    pub fn resolved_provider(&self) -> Result<Provider, LlmError> {
        match self.provider {
            Some(provider) => Ok(provider),
            None => match std::env::var("LABELSMITH_PROVIDER") {
                Ok(value) => value.parse(),
                Err(_) => Ok(Provider::default()),
            },
        }
    }

    /// Builds a client for the resolved provider behind the transport trait.
    pub fn build(self) -> Result<Arc<dyn LlmClientTrait>, LlmError> {
        match self.resolved_provider()? {
            Provider::OpenAi => Ok(Arc::new(self.build_openai()?)),
            Provider::Ollama => Ok(Arc::new(self.build_ollama()?)),
        }
    }

    /// Builds an [`OllamaClient`], reading `OLLAMA_HOST` if no URL was given.
    pub fn build_ollama(self) -> Result<OllamaClient, LlmError> {
        let base_url = resolve(self.base_url.clone(), "OLLAMA_HOST", DEFAULT_OLLAMA_URL);
        let base_url = validate_url(base_url)?.trim_end_matches('/').to_string();
        let client = self.http_client()?;

        Ok(OllamaClient {
            client,
            base_url,
            retry: self.retry.unwrap_or_default(),
        })
    }

    /// Builds an [`OpenAiClient`], reading `OPENAI_API_URL` and `OPENAI_API_KEY`
    /// if not given.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` when no key is configured.
    pub fn build_openai(self) -> Result<OpenAiClient, LlmError> {
        let api_url = resolve(self.base_url.clone(), "OPENAI_API_URL", DEFAULT_OPENAI_URL);
        let api_url = validate_url(api_url)?;

        let api_key = self
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(LlmError::MissingApiKey("openai"))?;

        let client = self.http_client()?;

        Ok(OpenAiClient {
            client,
            api_url,
            api_key,
            retry: self.retry.unwrap_or_default(),
        })
    }

    fn http_client(&self) -> Result<reqwest::blocking::Client, LlmError> {
        reqwest::blocking::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .connect_timeout(self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT))
            .build()
            .map_err(LlmError::Network)
    }
}

fn resolve(explicit: Option<String>, env_var: &str, default: &str) -> String {
    explicit
        .or_else(|| std::env::var(env_var).ok())
        .unwrap_or_else(|| default.to_string())
}

fn validate_url(url: String) -> Result<String, LlmError> {
    reqwest::Url::parse(&url).map_err(|e| LlmError::InvalidUrl(format!("{url}: {e}")))?;
    Ok(url)
}
