//! CLI command implementations

use super::output::{OutputEvent, OutputHandler};
use crate::config::{AceConfig, DataConfig};
use crate::graph::{GraphError, RunContext};
use crate::registry::{ChatRequest, RegistryError, WorkflowId, WorkflowRegistry};
use crate::workflows::classwork::{seed_students, write_students};
use std::path::Path;

/// Exit code for a run stopped by Ctrl+C
const EXIT_CANCELLED: i32 = 130;

/// Run a workflow and print its reply
pub async fn run_workflow(
    registry: &WorkflowRegistry,
    workflow_name: &str,
    request: ChatRequest,
    ctx: &RunContext,
    handler: &dyn OutputHandler,
) -> i32 {
    let id: WorkflowId = match workflow_name.parse() {
        Ok(id) => id,
        Err(e) => {
            handler.emit(OutputEvent::WorkflowError {
                error: e.to_string(),
            });
            return 1;
        }
    };

    handler.emit(OutputEvent::WorkflowStart {
        name: id.to_string(),
    });

    match registry.invoke(id, request, ctx).await {
        Ok(reply) => {
            handler.emit(OutputEvent::WorkflowComplete {
                name: id.to_string(),
                duration_ms: reply.elapsed_ms,
                steps: reply.steps.len(),
            });
            handler.reply(&reply);
            0
        }
        Err(e) => {
            handler.emit(OutputEvent::WorkflowError {
                error: format!("Workflow '{}' failed: {}", id, e),
            });
            match e {
                RegistryError::Graph(GraphError::Cancelled { .. }) => EXIT_CANCELLED,
                _ => 1,
            }
        }
    }
}

/// List available workflows
pub fn list_workflows(handler: &dyn OutputHandler) {
    for id in WorkflowId::all() {
        let marker = if id.uses_oracle() { " (oracle)" } else { "" };
        handler.emit(OutputEvent::Info {
            message: format!("{:<14} {}{}", id.as_str(), id.description(), marker),
        });
    }
}

/// Check oracle configuration and student data
pub async fn doctor(config: &AceConfig, working_dir: &Path, handler: &dyn OutputHandler) -> i32 {
    handler.emit(OutputEvent::Info {
        message: "Checking oracle...".into(),
    });

    let oracle = config.oracle();
    let mut all_ok = true;

    let status = if oracle.is_http() {
        match (&oracle.api_key_env, oracle.resolve_api_key()) {
            (_, Some(_)) => format!("✓ {} (http: {})", oracle.display_name(), oracle.command),
            (Some(var), None) => {
                all_ok = false;
                format!(
                    "✗ {} (http: {} - ${} is not set)",
                    oracle.display_name(),
                    oracle.command,
                    var
                )
            }
            (None, None) => format!(
                "✓ {} (http: {}, no API key)",
                oracle.display_name(),
                oracle.command
            ),
        }
    } else {
        let check = tokio::process::Command::new("which")
            .arg(&oracle.command)
            .output()
            .await;

        match check {
            Ok(out) if out.status.success() => {
                format!("✓ {} (cli: {})", oracle.display_name(), oracle.command)
            }
            _ => {
                all_ok = false;
                format!(
                    "✗ {} (cli: {} - not found)",
                    oracle.display_name(),
                    oracle.command
                )
            }
        }
    };
    handler.emit(OutputEvent::Info { message: status });

    handler.emit(OutputEvent::Info {
        message: "\nChecking student data...".into(),
    });

    let path = config.data.student_data_path(working_dir);
    let message = match tokio::fs::try_exists(&path).await {
        Ok(true) => format!("✓ {}", path.display()),
        _ => {
            // Classwork still answers without data, so this is only a warning
            format!(
                "  {} not found; run `ace seed-data` to create it",
                path.display()
            )
        }
    };
    handler.emit(OutputEvent::Info { message });

    if all_ok { 0 } else { 1 }
}

/// Write a synthetic student dataset
pub async fn seed_data(
    out: Option<&Path>,
    count: usize,
    working_dir: &Path,
    handler: &dyn OutputHandler,
) -> i32 {
    let path = match out {
        Some(path) => path.to_path_buf(),
        None => DataConfig::default_path(working_dir),
    };

    let records = seed_students(count, &mut rand::rng());

    match write_students(&path, &records).await {
        Ok(()) => {
            handler.emit(OutputEvent::Info {
                message: format!("✓ Wrote {} students to {}", records.len(), path.display()),
            });
            0
        }
        Err(e) => {
            handler.emit(OutputEvent::WorkflowError {
                error: e.to_string(),
            });
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::output::testing::MockHandler;
    use crate::config::{NormalizationConfig, OracleConfig};
    use crate::graph::CancellationToken;
    use crate::oracle::testing::ScriptedOracle;
    use crate::template::PromptEngine;
    use crate::workflows::classwork::{JsonFileSource, MemorySource, Normalizer, StudentSource};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn registry() -> WorkflowRegistry {
        WorkflowRegistry::new(
            Arc::new(ScriptedOracle::new("faq").on("FAQ", "Fees are due in June.")),
            Arc::new(PromptEngine::new()),
            Normalizer::from_config(&NormalizationConfig::default()).unwrap(),
            Arc::new(MemorySource::new(Vec::new())),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_run_workflow_success() {
        let handler = MockHandler::default();
        let code = run_workflow(
            &registry(),
            "admissions",
            ChatRequest::new("When are fees due?"),
            &RunContext::new(),
            &handler,
        )
        .await;

        assert_eq!(code, 0);
        let replies = handler.replies();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].reply.as_deref(), Some("Fees are due in June."));
        assert!(matches!(
            handler.events().last(),
            Some(OutputEvent::WorkflowComplete { steps: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_run_workflow_unknown_name() {
        let handler = MockHandler::default();
        let code = run_workflow(
            &registry(),
            "hostel",
            ChatRequest::new("hi"),
            &RunContext::new(),
            &handler,
        )
        .await;

        assert_eq!(code, 1);
        assert!(handler.replies().is_empty());
        assert!(matches!(
            handler.events().as_slice(),
            [OutputEvent::WorkflowError { .. }]
        ));
    }

    #[tokio::test]
    async fn test_run_workflow_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = RunContext::new().with_cancellation(token);

        let handler = MockHandler::default();
        let code = run_workflow(
            &registry(),
            "classwork",
            ChatRequest::new("cse attendance"),
            &ctx,
            &handler,
        )
        .await;

        assert_eq!(code, EXIT_CANCELLED);
    }

    #[test]
    fn test_list_workflows() {
        let handler = MockHandler::default();
        list_workflows(&handler);

        let messages = handler.messages();
        assert_eq!(messages.len(), WorkflowId::all().len());
        assert!(messages[0].starts_with("admissions"));
        assert!(messages[0].ends_with("(oracle)"));
        assert!(!messages[1].ends_with("(oracle)"));
    }

    #[tokio::test]
    async fn test_doctor_missing_api_key() {
        let config = AceConfig {
            oracle: Some(OracleConfig {
                api_key: None,
                api_key_env: Some("ACE_TEST_KEY_THAT_IS_NEVER_SET".into()),
                ..OracleConfig::default()
            }),
            ..AceConfig::default()
        };
        let temp = TempDir::new().unwrap();
        let handler = MockHandler::default();

        let code = doctor(&config, temp.path(), &handler).await;

        assert_eq!(code, 1);
        let messages = handler.messages();
        assert!(messages.iter().any(|m| m.contains("is not set")));
        assert!(messages.iter().any(|m| m.contains("seed-data")));
    }

    #[tokio::test]
    async fn test_doctor_with_key_and_data() {
        let temp = TempDir::new().unwrap();
        let handler = MockHandler::default();
        assert_eq!(seed_data(None, 3, temp.path(), &handler).await, 0);

        let config = AceConfig {
            oracle: Some(OracleConfig {
                api_key: Some("test-key".into()),
                ..OracleConfig::default()
            }),
            ..AceConfig::default()
        };
        let handler = MockHandler::default();

        let code = doctor(&config, temp.path(), &handler).await;

        assert_eq!(code, 0);
        assert!(handler.messages().iter().all(|m| !m.contains("seed-data")));
    }

    #[tokio::test]
    async fn test_seed_data_round_trips() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("nested").join("students.json");
        let handler = MockHandler::default();

        let code = seed_data(Some(&out), 12, temp.path(), &handler).await;

        assert_eq!(code, 0);
        let records = JsonFileSource::new(&out).load().await.unwrap();
        assert_eq!(records.len(), 12);
        assert!(handler.messages()[0].contains("12 students"));
    }
}
