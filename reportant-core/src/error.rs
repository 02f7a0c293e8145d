//! Error types for the Reportant core.
//!
//! Uses `thiserror` for public API error types with structured error variants
//! covering LLM, retrieval, outline-synthesis, export, and configuration
//! domains.

use std::path::PathBuf;

/// Top-level error type for the Reportant core library.
#[derive(Debug, thiserror::Error)]
pub enum ReportantError {
    /// Caller-supplied topic, outline, or format selector is malformed.
    /// Always raised before any provider call is made.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Outline error: {0}")]
    Outline(#[from] OutlineError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReportantError {
    /// Construct an `InvalidInput` error from any message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Errors from LLM provider interactions.
///
/// During outline synthesis these abort the whole request; during section
/// generation they are fatal only for the section being streamed.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Streaming error: {message}")]
    Streaming { message: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },
}

/// Errors from the retrieval provider. Never fatal for a report run:
/// grounding degrades and generation proceeds without context.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("Retrieval query failed: {message}")]
    QueryFailed { message: String },

    #[error("Retrieval service connection failed: {message}")]
    Connection { message: String },

    #[error("Tabular data source error: {message}")]
    Tabular { message: String },
}

/// Errors from outline synthesis.
#[derive(Debug, thiserror::Error)]
pub enum OutlineError {
    /// The provider response could not be parsed into the outline schema.
    /// Not retried: blind retry on non-deterministic generation rarely
    /// self-corrects and wastes quota.
    #[error("Malformed outline response: {message}")]
    Malformed { message: String },
}

/// Errors from document export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to encode {format} document: {message}")]
    Render { format: String, message: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Environment variable not set: {var}")]
    EnvVarMissing { var: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// Convenience result alias for Reportant core operations.
pub type Result<T> = std::result::Result<T, ReportantError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReportantError::invalid_input("topic must not be empty");
        assert_eq!(err.to_string(), "Invalid input: topic must not be empty");

        let err: ReportantError = LlmError::Timeout { timeout_secs: 120 }.into();
        assert!(err.to_string().contains("120"));
    }

    #[test]
    fn test_error_conversion_chain() {
        fn fails() -> Result<()> {
            Err(OutlineError::Malformed {
                message: "no JSON block".to_string(),
            }
            .into())
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, ReportantError::Outline(_)));
    }
}
