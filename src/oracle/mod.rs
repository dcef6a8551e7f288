//! Classification/generation oracle
//!
//! The oracle is the external text-completion service the workflows consult
//! for routing decisions and generated replies. It is reached either over an
//! OpenAI-compatible HTTP API or through a local command.
//!
//! # Example
//!
//! ```ignore
//! use ace_graphs::oracle::{HttpOracle, Oracle, OracleRequest};
//!
//! let oracle = HttpOracle::new("groq", "https://api.groq.com/openai/v1")?
//!     .with_api_key(key)
//!     .with_model("llama-3.1-8b-instant");
//!
//! let completion = oracle.complete(&OracleRequest::new("Return ONLY the route name.")).await?;
//! println!("{}", completion.text);
//! ```

mod command;
mod http;
mod types;

pub use command::CommandOracle;
pub use http::HttpOracle;
pub use types::{Completion, Oracle, OracleError, OracleRequest};

use crate::config::OracleConfig;
use std::sync::Arc;

/// Create the oracle described by `config`
pub fn create_oracle(config: &OracleConfig) -> Result<Arc<dyn Oracle>, OracleError> {
    let name = config.display_name();
    if config.is_http() {
        Ok(Arc::new(HttpOracle::from_config(name, config)?))
    } else {
        Ok(Arc::new(CommandOracle::from_config(name, config)))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted oracle for tests

    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers prompts from a script of `(prompt fragment, reply)` pairs; the
    /// first fragment contained in the prompt wins. Unmatched prompts get the
    /// fallback reply.
    pub struct ScriptedOracle {
        script: Vec<(String, String)>,
        fallback: String,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedOracle {
        pub fn new(fallback: impl Into<String>) -> Self {
            Self {
                script: Vec::new(),
                fallback: fallback.into(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn on(mut self, fragment: impl Into<String>, reply: impl Into<String>) -> Self {
            self.script.push((fragment.into(), reply.into()));
            self
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Oracle for ScriptedOracle {
        async fn complete(&self, request: &OracleRequest) -> Result<Completion, OracleError> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            let reply = self
                .script
                .iter()
                .find(|(fragment, _)| request.prompt.contains(fragment.as_str()))
                .map(|(_, reply)| reply.clone())
                .unwrap_or_else(|| self.fallback.clone());
            Ok(Completion::new(reply, "scripted".into(), Duration::ZERO))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// Oracle that always fails
    pub struct DownOracle;

    #[async_trait]
    impl Oracle for DownOracle {
        async fn complete(&self, _request: &OracleRequest) -> Result<Completion, OracleError> {
            Err(OracleError::network("connection refused"))
        }

        fn name(&self) -> &str {
            "down"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_http_oracle() {
        let config = OracleConfig {
            command: "https://api.groq.com/openai/v1".into(),
            ..Default::default()
        };
        let oracle = create_oracle(&config).unwrap();
        assert_eq!(oracle.name(), "api.groq.com");
    }

    #[test]
    fn test_create_command_oracle() {
        let config = OracleConfig {
            command: "ollama".into(),
            ..Default::default()
        };
        let oracle = create_oracle(&config).unwrap();
        assert_eq!(oracle.name(), "ollama");
    }
}
