//! Oracle backed by a local command (e.g. `ollama run`, `llm`, a test script)

use super::types::{Completion, Oracle, OracleError, OracleRequest};
use crate::config::OracleConfig;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Oracle that passes the prompt as the last argument of a command and reads
/// the completion from its stdout
#[derive(Debug, Clone)]
pub struct CommandOracle {
    /// Oracle name
    name: String,

    /// Command to execute
    command: String,

    /// Default arguments
    args: Vec<String>,

    /// Default timeout
    timeout: Duration,

    /// Environment variables to set
    env: Vec<(String, String)>,
}

impl CommandOracle {
    /// Create a command oracle from config
    pub fn from_config(name: impl Into<String>, config: &OracleConfig) -> Self {
        let mut env: Vec<_> = config
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        env.sort();

        Self {
            name: name.into(),
            command: config.command.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout),
            env,
        }
    }

    /// Create a command oracle with explicit parameters
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(60),
            env: Vec::new(),
        }
    }

    /// Add default arguments
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn build_command(&self, request: &OracleRequest) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        cmd.arg(&request.prompt);

        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.stdin(Stdio::null());
        // Dropping a cancelled run's future must not leave the process behind
        cmd.kill_on_drop(true);

        cmd
    }
}

#[async_trait]
impl Oracle for CommandOracle {
    async fn complete(&self, request: &OracleRequest) -> Result<Completion, OracleError> {
        let start = Instant::now();
        let timeout = request.timeout.unwrap_or(self.timeout);

        tracing::debug!(
            oracle = %self.name,
            command = %self.command,
            prompt_len = request.prompt.len(),
            "Spawning oracle command"
        );

        let mut child = self
            .build_command(request)
            .spawn()
            .map_err(|e| OracleError::Unavailable {
                message: format!("failed to spawn '{}': {}", self.command, e),
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| OracleError::parse("stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| OracleError::parse("stderr was not captured"))?;

        let mut stdout_reader = BufReader::new(stdout).lines();
        let mut stderr_reader = BufReader::new(stderr).lines();

        let mut stdout_lines = Vec::new();
        let mut stderr_lines = Vec::new();

        let result = tokio::time::timeout(timeout, async {
            let mut stderr_done = false;
            loop {
                tokio::select! {
                    biased;
                    line = stdout_reader.next_line() => {
                        match line {
                            Ok(Some(l)) => stdout_lines.push(l),
                            Ok(None) => break,
                            Err(e) => return Err(OracleError::parse(format!("stdout read error: {}", e))),
                        }
                    }
                    line = stderr_reader.next_line(), if !stderr_done => {
                        match line {
                            Ok(Some(l)) => stderr_lines.push(l),
                            Ok(None) => stderr_done = true,
                            Err(e) => return Err(OracleError::parse(format!("stderr read error: {}", e))),
                        }
                    }
                }
            }

            child.wait().await.map_err(|e| OracleError::Unavailable {
                message: format!("failed to wait for process: {}", e),
            })
        })
        .await;

        let elapsed = start.elapsed();

        match result {
            Ok(Ok(status)) => {
                let stdout_text = stdout_lines.join("\n");
                if status.success() {
                    Ok(Completion::new(stdout_text, self.name.clone(), elapsed))
                } else {
                    Err(OracleError::execution_failed(
                        status.code(),
                        stdout_text,
                        stderr_lines.join("\n"),
                    ))
                }
            }
            Ok(Err(e)) => {
                let _ = child.kill().await;
                let _ = child.wait().await;
                Err(e)
            }
            Err(_) => {
                let _ = child.kill().await;
                let partial = if stdout_lines.is_empty() {
                    None
                } else {
                    Some(stdout_lines.join("\n"))
                };
                Err(OracleError::timeout(elapsed, partial))
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        tokio::process::Command::new("which")
            .arg(&self.command)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }
}
