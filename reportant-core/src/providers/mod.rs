//! LLM provider implementations.
//!
//! Provides the OpenAI-compatible implementation of the `LlmProvider` trait,
//! which covers OpenAI itself as well as compatible endpoints (Upstage Solar,
//! Azure, vLLM, Ollama). Use `create_provider()` to instantiate a provider
//! from configuration.
//!
//! No retry machinery lives here: generation is non-deterministic and a
//! failed call is surfaced to the caller rather than silently repeated.

pub mod openai_compat;

use crate::brain::LlmProvider;
use crate::config::LlmConfig;
use crate::error::LlmError;
use std::sync::Arc;

pub use openai_compat::OpenAiCompatibleProvider;

/// Resolve the API key for a provider from the configured environment
/// variable.
pub fn resolve_api_key(config: &LlmConfig) -> Result<String, LlmError> {
    std::env::var(&config.api_key_env).map_err(|_| LlmError::AuthFailed {
        provider: format!("env var '{}' not set", config.api_key_env),
    })
}

/// Instantiate the provider described by the configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let api_key = resolve_api_key(config)?;
    let provider = OpenAiCompatibleProvider::new(
        &config.base_url,
        &api_key,
        &config.model,
        config.timeout_secs,
    );
    Ok(Arc::new(provider))
}
