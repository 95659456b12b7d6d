//! Generative-model transport: errors, the client trait, generation settings
//! and the retry policy shared by every backend.

use std::thread;
use std::time::Duration;

use thiserror::Error;

/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
/// Default cap on generated tokens.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1000;

/// Errors that can occur when calling a generative model.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Response body could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Well-formed response that lacks the expected content
    #[error("Model API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The selected provider needs an API key and none was configured
    #[error("Missing API key for provider {0}")]
    MissingApiKey(&'static str),

    /// Generation settings outside their allowed range
    #[error("Invalid generation settings: {0}")]
    InvalidSettings(String),
}

impl LlmError {
    /// Classifies a reqwest failure as a timeout or a generic network error.
    pub(crate) fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }
}

/// Per-request generation settings sent along with the prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    /// Sampling temperature, 0.0-1.0.
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

impl GenerationSettings {
    /// Settings with the given model and default temperature and token cap.
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Reads `LABELSMITH_MODEL`, `LABELSMITH_TEMPERATURE` and `LABELSMITH_MAX_TOKENS`,
    /// falling back to defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::InvalidSettings` if a variable is set but does not
    /// parse, or the resulting settings fail [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, LlmError> {
        let mut settings = Self::default();

        if let Ok(model) = std::env::var("LABELSMITH_MODEL") {
            settings.model = model;
        }
        if let Ok(raw) = std::env::var("LABELSMITH_TEMPERATURE") {
            settings.temperature = raw.trim().parse().map_err(|_| {
                LlmError::InvalidSettings(format!("LABELSMITH_TEMPERATURE is not a number: {raw}"))
            })?;
        }
        if let Ok(raw) = std::env::var("LABELSMITH_MAX_TOKENS") {
            settings.max_output_tokens = raw.trim().parse().map_err(|_| {
                LlmError::InvalidSettings(format!("LABELSMITH_MAX_TOKENS is not an integer: {raw}"))
            })?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Checks that the model is named, temperature is within 0.0-1.0 and the
    /// token cap is positive.
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.model.trim().is_empty() {
            return Err(LlmError::InvalidSettings("model must not be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(LlmError::InvalidSettings(format!(
                "temperature must be within 0.0-1.0, got {}",
                self.temperature
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(LlmError::InvalidSettings(
                "max_output_tokens must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for generative-model transports.
///
/// This trait enables mocking in unit tests and keeps the tagging pipeline
/// independent of any particular provider.
pub trait LlmClientTrait: Send + Sync {
    /// Sends `prompt` and returns the model's raw text answer.
    fn generate(&self, prompt: &str, settings: &GenerationSettings) -> Result<String, LlmError>;
}

/// Delays between attempts of a transport call.
///
/// The call is tried once, then once more after each delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    /// Three retries after 1s, 2s and 4s.
    fn default() -> Self {
        Self::with_delays([1, 2, 4].map(Duration::from_secs))
    }
}

impl RetryPolicy {
    pub fn with_delays(delays: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            delays: delays.into_iter().collect(),
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self { delays: Vec::new() }
    }

    pub fn max_retries(&self) -> usize {
        self.delays.len()
    }
}

/// Retries an operation with the backoff described by `policy`.
///
/// Only transient errors (network errors, timeouts, HTTP 5xx) are retried;
/// everything else is returned immediately. When all attempts fail, the last
/// error is returned.
pub fn retry_with_backoff<F, T>(policy: &RetryPolicy, mut f: F) -> Result<T, LlmError>
where
    F: FnMut() -> Result<T, LlmError>,
{
    let mut last_error = match f() {
        Ok(result) => return Ok(result),
        Err(e) if !should_retry(&e) => return Err(e),
        Err(e) => e,
    };

    for (attempt, delay) in policy.delays.iter().enumerate() {
        tracing::debug!(
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            error = %last_error,
            "retrying model call"
        );
        thread::sleep(*delay);

        match f() {
            Ok(result) => return Ok(result),
            Err(e) if !should_retry(&e) => return Err(e),
            Err(e) => last_error = e,
        }
    }

    Err(last_error)
}

/// Determines if an error should be retried.
///
/// Returns `true` for transient errors (HTTP 5xx, network errors, timeouts).
fn should_retry(error: &LlmError) -> bool {
    match error {
        LlmError::Network(_) | LlmError::Timeout(_) => true,
        LlmError::Http { status } => (500..600).contains(status),
        LlmError::Serialization(_)
        | LlmError::Api { .. }
        | LlmError::InvalidUrl(_)
        | LlmError::MissingApiKey(_)
        | LlmError::InvalidSettings(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::error::Error;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn network_error() -> LlmError {
        LlmError::Network(
            reqwest::blocking::Client::new()
                .get("not-a-valid-url")
                .build()
                .unwrap_err(),
        )
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::with_delays([Duration::ZERO; 3])
    }

    fn clear_settings_env() {
        unsafe {
            std::env::remove_var("LABELSMITH_MODEL");
            std::env::remove_var("LABELSMITH_TEMPERATURE");
            std::env::remove_var("LABELSMITH_MAX_TOKENS");
        }
    }

    #[test]
    fn network_error_variant_creation_and_display() {
        let error_msg = format!("{}", network_error());
        assert!(error_msg.contains("Network error"));
    }

    #[test]
    fn http_error_variant_with_status_code() {
        let error_msg = format!("{}", LlmError::Http { status: 404 });
        assert!(error_msg.contains("HTTP error"));
        assert!(error_msg.contains("404"));
    }

    #[test]
    fn serialization_error_variant_wraps_serde_errors() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error = LlmError::Serialization(json_error);

        assert!(format!("{}", error).contains("Serialization error"));
        assert!(error.source().is_some());
    }

    #[test]
    fn default_settings_match_documented_values() {
        let settings = GenerationSettings::default();
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.temperature, 0.3);
        assert_eq!(settings.max_output_tokens, 1000);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut settings = GenerationSettings::default();
        settings.temperature = 1.5;
        assert!(matches!(settings.validate(), Err(LlmError::InvalidSettings(_))));

        let mut settings = GenerationSettings::default();
        settings.max_output_tokens = 0;
        assert!(settings.validate().is_err());

        assert!(GenerationSettings::with_model("  ").validate().is_err());
    }

    #[test]
    #[serial]
    fn from_env_reads_overrides() {
        clear_settings_env();
        unsafe {
            std::env::set_var("LABELSMITH_MODEL", "llama3.1:8b");
            std::env::set_var("LABELSMITH_TEMPERATURE", "0.0");
            std::env::set_var("LABELSMITH_MAX_TOKENS", "256");
        }

        let settings = GenerationSettings::from_env().unwrap();
        assert_eq!(settings.model, "llama3.1:8b");
        assert_eq!(settings.temperature, 0.0);
        assert_eq!(settings.max_output_tokens, 256);

        clear_settings_env();
    }

    #[test]
    #[serial]
    fn from_env_rejects_unparseable_temperature() {
        clear_settings_env();
        unsafe {
            std::env::set_var("LABELSMITH_TEMPERATURE", "warm");
        }

        assert!(matches!(
            GenerationSettings::from_env(),
            Err(LlmError::InvalidSettings(_))
        ));

        clear_settings_env();
    }

    #[test]
    fn retry_succeeds_after_transient_network_error() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let result = retry_with_backoff(&fast_policy(), move || {
            if counter.fetch_add(1, Ordering::SeqCst) < 1 {
                Err(network_error())
            } else {
                Ok("success")
            }
        });

        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn retry_stops_after_policy_is_exhausted() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let result: Result<&str, LlmError> = retry_with_backoff(&fast_policy(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Http { status: 503 })
        });

        assert!(matches!(result, Err(LlmError::Http { status: 503 })));
        // Initial attempt + 3 retries.
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn retry_does_not_occur_on_http_4xx_errors() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let result: Result<&str, LlmError> = retry_with_backoff(&fast_policy(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Http { status: 404 })
        });

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retry_does_not_occur_on_api_errors() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let result: Result<&str, LlmError> = retry_with_backoff(&fast_policy(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Api {
                message: "no choices".to_string(),
            })
        });

        assert!(matches!(result, Err(LlmError::Api { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn no_retry_policy_makes_a_single_attempt() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let _: Result<&str, LlmError> = retry_with_backoff(&RetryPolicy::none(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(network_error())
        });

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retry_delays_are_applied_between_attempts() {
        use std::time::Instant;

        let policy = RetryPolicy::with_delays([Duration::from_millis(20), Duration::from_millis(40)]);
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let start = Instant::now();

        let _: Result<&str, LlmError> = retry_with_backoff(&policy, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Http { status: 500 })
        });

        assert!(start.elapsed() >= Duration::from_millis(60));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn default_policy_has_three_retries() {
        assert_eq!(RetryPolicy::default().max_retries(), 3);
    }

    #[test]
    fn trait_can_be_implemented_by_mock_struct() {
        struct MockClient;

        impl LlmClientTrait for MockClient {
            fn generate(&self, prompt: &str, settings: &GenerationSettings) -> Result<String, LlmError> {
                Ok(format!("{}:{}", settings.model, prompt))
            }
        }

        let settings = GenerationSettings::with_model("mock");
        assert_eq!(MockClient.generate("hi", &settings).unwrap(), "mock:hi");
    }
}
