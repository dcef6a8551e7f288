//! Oracle configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for the classification/generation oracle
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OracleConfig {
    /// Display name (derived from the command when absent)
    pub name: Option<String>,

    /// Command to execute (or HTTP base URL for API oracles)
    #[serde(default = "default_command")]
    pub command: String,

    /// Arguments to pass to the command
    #[serde(default)]
    pub args: Vec<String>,

    /// Model name (for API oracles)
    #[serde(default = "default_model")]
    pub model: Option<String>,

    /// API key; prefer `api_key_env` outside of local testing
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,

    /// Timeout in seconds for a single completion
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Sampling temperature (API oracles)
    #[serde(default = "default_temperature")]
    pub temperature: Option<f32>,

    /// Additional environment variables for the command
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_command() -> String {
    "https://api.groq.com/openai/v1".into()
}

fn default_model() -> Option<String> {
    Some("llama-3.1-8b-instant".into())
}

fn default_api_key_env() -> Option<String> {
    Some("GROQ_API_KEY".into())
}

fn default_timeout() -> u64 {
    60
}

fn default_temperature() -> Option<f32> {
    Some(0.2)
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            name: None,
            command: default_command(),
            args: Vec::new(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            timeout: default_timeout(),
            temperature: default_temperature(),
            env: HashMap::new(),
        }
    }
}

impl OracleConfig {
    /// Returns true if this is an HTTP API oracle (URL starts with http)
    pub fn is_http(&self) -> bool {
        self.command.starts_with("http://") || self.command.starts_with("https://")
    }

    /// API key from config, falling back to the configured environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(|| {
            self.api_key_env
                .as_deref()
                .and_then(|var| std::env::var(var).ok())
                .filter(|key| !key.is_empty())
        })
    }

    /// Name used in logs: explicit name, URL host, or command file name
    pub fn display_name(&self) -> String {
        if let Some(ref name) = self.name {
            return name.clone();
        }
        if self.is_http() {
            let rest = self
                .command
                .split_once("://")
                .map(|(_, rest)| rest)
                .unwrap_or(&self.command);
            return rest.split('/').next().unwrap_or(rest).to_string();
        }
        std::path::Path::new(&self.command)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.command)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal() {
        let config: OracleConfig = toml::from_str("").unwrap();
        assert!(config.is_http());
        assert_eq!(config.model.as_deref(), Some("llama-3.1-8b-instant"));
        assert_eq!(config.timeout, 60);
        assert_eq!(config.temperature, Some(0.2));
    }

    #[test]
    fn test_deserialize_command_oracle() {
        let toml = r#"
            command = "/usr/local/bin/ollama"
            args = ["run", "llama3"]
            timeout = 30
        "#;
        let config: OracleConfig = toml::from_str(toml).unwrap();
        assert!(!config.is_http());
        assert_eq!(config.args, vec!["run", "llama3"]);
        assert_eq!(config.display_name(), "ollama");
    }

    #[test]
    fn test_display_name() {
        let config = OracleConfig {
            command: "http://localhost:11434/v1".into(),
            ..Default::default()
        };
        assert_eq!(config.display_name(), "localhost:11434");

        let config = OracleConfig {
            name: Some("router".into()),
            ..Default::default()
        };
        assert_eq!(config.display_name(), "router");
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let config = OracleConfig {
            api_key: Some("gsk-inline".into()),
            api_key_env: Some("ACE_TEST_UNSET_KEY_VAR".into()),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("gsk-inline"));

        let config = OracleConfig {
            api_key_env: Some("ACE_TEST_UNSET_KEY_VAR".into()),
            ..Default::default()
        };
        assert!(config.resolve_api_key().is_none());
    }

    #[test]
    fn test_reject_unknown_fields() {
        let result: Result<OracleConfig, _> = toml::from_str(r#"unknown_field = "value""#);
        assert!(result.is_err());
    }
}
