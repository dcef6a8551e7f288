//! Core types and traits for oracle calls

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Error types that can occur while consulting the oracle
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    /// Request timed out
    #[error("timeout after {elapsed:?}")]
    Timeout {
        elapsed: Duration,
        partial_output: Option<String>,
    },

    /// Rate limited by the provider
    #[error("rate limited: {message}")]
    RateLimit { message: String },

    /// Authentication failed
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// Network error
    #[error("network error: {message}")]
    Network { message: String },

    /// Failed to parse response
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Command execution failed
    #[error("execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// Oracle unavailable
    #[error("oracle unavailable: {message}")]
    Unavailable { message: String },

    /// Invalid configuration
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl OracleError {
    /// Create a timeout error
    pub fn timeout(elapsed: Duration, partial: Option<String>) -> Self {
        Self::Timeout {
            elapsed,
            partial_output: partial,
        }
    }

    /// Create a rate limit error
    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimit {
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an execution failed error
    pub fn execution_failed(exit_code: Option<i32>, stdout: String, stderr: String) -> Self {
        Self::ExecutionFailed {
            exit_code,
            stdout,
            stderr,
        }
    }
}

/// Completion returned by the oracle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// Raw completion text
    pub text: String,

    /// Oracle name that produced this completion
    pub oracle: String,

    /// Model used (if known)
    pub model: Option<String>,

    /// Time taken to execute
    pub duration: Duration,
}

impl Completion {
    /// Create a new completion with just text
    pub fn new(text: String, oracle: String, duration: Duration) -> Self {
        Self {
            text,
            oracle,
            model: None,
            duration,
        }
    }

    /// Add model info
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Prompt sent to the oracle
#[derive(Debug, Clone)]
pub struct OracleRequest {
    /// The prompt to complete
    pub prompt: String,

    /// Override timeout for this request
    pub timeout: Option<Duration>,
}

impl OracleRequest {
    /// Create a simple request with just a prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            timeout: None,
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Cap the timeout at `limit`, keeping a shorter one if already set
    pub fn with_timeout_cap(mut self, limit: Option<Duration>) -> Self {
        if let Some(limit) = limit {
            self.timeout = Some(self.timeout.map_or(limit, |t| t.min(limit)));
        }
        self
    }
}

/// The external text-completion service.
///
/// Treated as opaque: callers impose no structure on the completion beyond
/// what their own parsing extracts.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Complete a prompt
    async fn complete(&self, request: &OracleRequest) -> Result<Completion, OracleError>;

    /// Get the oracle name
    fn name(&self) -> &str;

    /// Check if this oracle is reachable
    async fn is_available(&self) -> bool {
        true
    }
}
