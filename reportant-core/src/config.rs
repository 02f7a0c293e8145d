//! Configuration system for Reportant.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> environment. Configuration is loaded from
//! `~/.config/reportant/config.toml` and/or `reportant.toml` in the working
//! directory; `REPORTANT_`-prefixed environment variables override both
//! (`REPORTANT_LLM__MODEL=solar-mini`).

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportantConfig {
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub server: ServerConfig,
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider kind; currently only `openai-compatible`.
    pub provider: String,
    /// API root, e.g. `https://api.openai.com/v1` or
    /// `https://api.upstage.ai/v1/solar`.
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai-compatible".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4.1-nano".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Retrieval and tabular grounding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Snippet-search endpoint; grounding is skipped when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub top_k: usize,
    pub timeout_secs: u64,
    /// JSON file of tabular rows; tabular grounding is skipped when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tabular_data_path: Option<PathBuf>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            top_k: 5,
            timeout_secs: 30,
            tabular_data_path: None,
        }
    }
}

/// Section generation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_tokens: usize,
    pub max_context_tokens: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1_024,
            max_context_tokens: 2_000,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8940,
        }
    }
}

/// Load configuration with the standard layering. `config_path` pins an
/// explicit file; otherwise the user and workspace locations are merged when
/// present.
pub fn load_config(config_path: Option<&Path>) -> Result<ReportantConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(ReportantConfig::default()));

    match config_path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            figment = figment.merge(Toml::file(path));
        }
        None => {
            if let Some(dirs) = directories::ProjectDirs::from("dev", "reportant", "reportant") {
                let user_config = dirs.config_dir().join("config.toml");
                if user_config.exists() {
                    figment = figment.merge(Toml::file(&user_config));
                }
            }
            let ws_config = Path::new("reportant.toml");
            if ws_config.exists() {
                figment = figment.merge(Toml::file(ws_config));
            }
        }
    }

    figment = figment.merge(Env::prefixed("REPORTANT_").split("__"));

    figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = ReportantConfig::default();
        assert_eq!(config.llm.model, "gpt-4.1-nano");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.server.port, 8940);
        assert!(config.retrieval.endpoint.is_none());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[llm]
base_url = "https://api.upstage.ai/v1/solar"
model = "solar-mini"
api_key_env = "UPSTAGE_API_KEY"

[server]
port = 9000
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.llm.model, "solar-mini");
        assert_eq!(config.llm.api_key_env, "UPSTAGE_API_KEY");
        assert_eq!(config.server.port, 9000);
        // Untouched sections keep their defaults.
        assert_eq!(config.generation.max_tokens, 1_024);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = load_config(Some(Path::new("/nonexistent/reportant.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = ReportantConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let back: ReportantConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(back.llm.model, config.llm.model);
        assert_eq!(back.server.port, config.server.port);
    }
}
