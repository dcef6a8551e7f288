//! HTTP oracle for OpenAI-compatible chat completion APIs (Groq, OpenAI, Ollama)

use super::types::{Completion, Oracle, OracleError, OracleRequest};
use crate::config::OracleConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Oracle backed by an OpenAI-compatible HTTP API
#[derive(Debug, Clone)]
pub struct HttpOracle {
    /// Oracle name
    name: String,

    /// Base URL for the API
    base_url: String,

    /// API key (if required)
    api_key: Option<String>,

    /// Model ID to use
    model: Option<String>,

    /// Sampling temperature
    temperature: Option<f32>,

    /// Default timeout
    timeout: Duration,

    /// HTTP client
    client: reqwest::Client,
}

/// OpenAI-compatible chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl HttpOracle {
    /// Create an HTTP oracle from config
    pub fn from_config(name: impl Into<String>, config: &OracleConfig) -> Result<Self, OracleError> {
        let timeout = Duration::from_secs(config.timeout);
        Ok(Self {
            name: name.into(),
            base_url: config.command.clone(), // For HTTP oracles, command is the base URL
            api_key: config.resolve_api_key(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout,
            client: build_client(timeout)?,
        })
    }

    /// Create an HTTP oracle with explicit parameters
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Result<Self, OracleError> {
        let timeout = Duration::from_secs(60);
        Ok(Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: None,
            model: None,
            temperature: None,
            timeout,
            client: build_client(timeout)?,
        })
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the chat completion URL
    fn chat_completion_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }

    /// Map HTTP status to OracleError
    fn map_http_error(&self, status: reqwest::StatusCode, body: &str) -> OracleError {
        match status.as_u16() {
            401 | 403 => OracleError::auth(format!("HTTP {}: {}", status, body)),
            429 => OracleError::rate_limit(format!("HTTP {}: {}", status, body)),
            408 | 504 => OracleError::timeout(self.timeout, None),
            400..=499 => OracleError::config(format!("HTTP {}: {}", status, body)),
            500..=599 => OracleError::network(format!("HTTP {}: {}", status, body)),
            _ => OracleError::network(format!("unexpected HTTP {}: {}", status, body)),
        }
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, OracleError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| OracleError::config(format!("failed to build HTTP client: {}", e)))
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn complete(&self, request: &OracleRequest) -> Result<Completion, OracleError> {
        let start = Instant::now();

        let messages = vec![Message {
            role: "user".into(),
            content: request.prompt.clone(),
        }];

        let body = ChatCompletionRequest {
            model: self
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.into()),
            messages,
            temperature: self.temperature,
        };

        let mut http_request = self.client.post(self.chat_completion_url()).json(&body);
        if let Some(ref key) = self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let timeout = request.timeout.unwrap_or(self.timeout);
        tracing::debug!(
            oracle = %self.name,
            prompt_len = request.prompt.len(),
            timeout_ms = timeout.as_millis() as u64,
            "Sending completion request"
        );

        let result = tokio::time::timeout(timeout, http_request.send()).await;
        let elapsed = start.elapsed();

        match result {
            Ok(Ok(response)) => {
                let status = response.status();

                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(self.map_http_error(status, &body));
                }

                let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
                    OracleError::parse(format!("failed to parse response: {}", e))
                })?;

                let text = completion
                    .choices
                    .first()
                    .and_then(|c| c.message.content.clone())
                    .unwrap_or_default();

                let mut result = Completion::new(text, self.name.clone(), elapsed);
                if let Some(model) = completion.model {
                    result = result.with_model(model);
                }

                Ok(result)
            }
            Ok(Err(e)) => {
                if e.is_timeout() {
                    Err(OracleError::timeout(elapsed, None))
                } else if e.is_connect() {
                    Err(OracleError::network(format!("connection failed: {}", e)))
                } else {
                    Err(OracleError::network(format!("request failed: {}", e)))
                }
            }
            Err(_) => Err(OracleError::timeout(elapsed, None)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        // Most OpenAI-compatible APIs expose a models listing we can ping
        let url = format!("{}/models", self.base_url.trim_end_matches('/'));

        let mut request = self.client.get(&url);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        match tokio::time::timeout(Duration::from_secs(5), request.send()).await {
            Ok(Ok(response)) => response.status().is_success(),
            _ => false,
        }
    }
}
