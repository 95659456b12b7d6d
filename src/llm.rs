//! Generative-model transport.
//!
//! This module provides blocking HTTP clients for Ollama and OpenAI-compatible
//! APIs behind one trait, including error handling, retry logic, and timeout
//! configuration.

mod builder;
mod client;
mod ollama;
mod openai;

pub use builder::{DEFAULT_OLLAMA_URL, DEFAULT_OPENAI_URL, LlmClientBuilder, Provider};
pub use client::{
    DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, GenerationSettings,
    LlmClientTrait, LlmError, RetryPolicy, retry_with_backoff,
};
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
