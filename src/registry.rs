//! Workflow registry
//!
//! Builds every graph once and dispatches chat requests to them by workflow
//! id. The registry is cheap to clone; all clones share the same graphs.

use crate::classify::Prompter;
use crate::config::AceConfig;
use crate::graph::{Graph, GraphError, Label, RunContext, RunOutcome, WorkflowState};
use crate::oracle::{Oracle, OracleError, create_oracle};
use crate::template::PromptEngine;
use crate::workflows::admissions::{self, AdmissionsState};
use crate::workflows::classwork::{
    self, ClassworkState, JsonFileSource, NormalizationError, Normalizer, StudentSource,
};
use crate::workflows::placements::{self, PlacementKind, PlacementsState, ValidationStatus};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Message used for placement requests that arrive without one
const PLACEMENT_TRIGGER: &str = "trigger";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown workflow '{0}'; run `ace workflows` to list them")]
    UnknownWorkflow(String),

    #[error("workflow '{workflow}' requires a message")]
    EmptyMessage { workflow: WorkflowId },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("invalid normalization rules: {0}")]
    Normalization(#[from] NormalizationError),

    #[error("cannot create oracle: {0}")]
    Oracle(#[from] OracleError),
}

/// Workflow identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowId {
    Admissions,
    Classwork,
    Placements(PlacementKind),
}

impl WorkflowId {
    /// Every workflow, in listing order
    pub fn all() -> Vec<WorkflowId> {
        let mut ids = vec![WorkflowId::Admissions, WorkflowId::Classwork];
        ids.extend(PlacementKind::ALL.into_iter().map(WorkflowId::Placements));
        ids
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowId::Admissions => "admissions",
            WorkflowId::Classwork => "classwork",
            WorkflowId::Placements(kind) => kind.as_str(),
        }
    }

    /// One-line description for listings
    pub fn description(&self) -> &'static str {
        match self {
            WorkflowId::Admissions => "Admissions assistant (FAQ, tracking, departments, admin)",
            WorkflowId::Classwork => "Academic query over student attendance and grades",
            WorkflowId::Placements(PlacementKind::Dashboard) => "Placement dashboard summary",
            WorkflowId::Placements(PlacementKind::Resume) => "Resume critique",
            WorkflowId::Placements(PlacementKind::Prep) => "Interview preparation material",
            WorkflowId::Placements(PlacementKind::Shortlisting) => "Shortlisting results",
            WorkflowId::Placements(PlacementKind::Tracking) => "Application tracking",
            WorkflowId::Placements(PlacementKind::Notification) => "Placement notifications",
        }
    }

    /// Whether the oracle is consulted on this workflow's path
    pub fn uses_oracle(&self) -> bool {
        matches!(
            self,
            WorkflowId::Admissions | WorkflowId::Placements(PlacementKind::Resume)
        )
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        WorkflowId::all()
            .into_iter()
            .find(|id| id.as_str() == name)
            .ok_or_else(|| RegistryError::UnknownWorkflow(s.to_string()))
    }
}

impl Serialize for WorkflowId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Caller-facing request
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub message: String,
    pub user_id: Option<i64>,
    pub role_id: Option<i64>,
    pub role: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

/// Caller-facing reply
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub workflow: WorkflowId,
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_status: Option<ValidationStatus>,
    /// Steps visited, in order
    pub steps: Vec<String>,
    pub elapsed_ms: u64,
}

impl ChatReply {
    fn from_outcome<S: WorkflowState>(workflow: WorkflowId, outcome: &RunOutcome<S>) -> Self {
        Self {
            workflow,
            reply: None,
            route: None,
            validation_status: None,
            steps: outcome.trace.iter().map(|r| r.step.clone()).collect(),
            elapsed_ms: outcome.elapsed.as_millis() as u64,
        }
    }
}

/// Every compiled workflow graph
#[derive(Clone)]
pub struct WorkflowRegistry {
    admissions: Arc<Graph<AdmissionsState>>,
    classwork: Arc<Graph<ClassworkState>>,
    placements: HashMap<PlacementKind, Arc<Graph<PlacementsState>>>,
}

impl WorkflowRegistry {
    /// Build every graph
    pub fn new(
        oracle: Arc<dyn Oracle>,
        prompts: Arc<PromptEngine>,
        normalizer: Normalizer,
        source: Arc<dyn StudentSource>,
    ) -> Result<Self, RegistryError> {
        let prompter = Prompter::new(oracle, prompts);

        let placements = PlacementKind::ALL
            .into_iter()
            .map(|kind| Ok((kind, Arc::new(placements::build(kind, prompter.clone())?))))
            .collect::<Result<HashMap<_, _>, GraphError>>()?;

        let registry = Self {
            admissions: Arc::new(admissions::build(prompter)?),
            classwork: Arc::new(classwork::build(normalizer, source)?),
            placements,
        };
        info!(workflows = WorkflowId::all().len(), "Workflow registry ready");
        Ok(registry)
    }

    /// Build every graph from configuration rooted at `project_dir`
    pub fn from_config(config: &AceConfig, project_dir: &Path) -> Result<Self, RegistryError> {
        let oracle = create_oracle(&config.oracle())?;
        let normalizer = Normalizer::from_config(&config.normalization)?;
        let source = JsonFileSource::new(config.data.student_data_path(project_dir));
        Self::new(
            oracle,
            Arc::new(PromptEngine::new()),
            normalizer,
            Arc::new(source),
        )
    }

    /// Resolve `name` and run that workflow
    pub async fn invoke_named(
        &self,
        name: &str,
        request: ChatRequest,
        ctx: &RunContext,
    ) -> Result<ChatReply, RegistryError> {
        let id: WorkflowId = name.parse()?;
        self.invoke(id, request, ctx).await
    }

    /// Run one workflow for `request`
    pub async fn invoke(
        &self,
        id: WorkflowId,
        request: ChatRequest,
        ctx: &RunContext,
    ) -> Result<ChatReply, RegistryError> {
        let message = request.message.trim().to_string();
        info!(workflow = %id, "Invoking workflow");

        match id {
            WorkflowId::Admissions => {
                require_message(id, &message)?;
                let state =
                    AdmissionsState::new(message).with_user(request.user_id, request.role_id);
                let outcome = self.admissions.run(state, ctx).await?;
                Ok(ChatReply {
                    reply: outcome.state.reply.clone(),
                    route: outcome.state.route.map(|route| route.as_str().to_string()),
                    ..ChatReply::from_outcome(id, &outcome)
                })
            }
            WorkflowId::Classwork => {
                require_message(id, &message)?;
                let mut state = ClassworkState::new(message);
                state.role = request.role;
                if let Some(user_id) = request.user_id {
                    state = state.with_context("user_id", user_id);
                }
                let outcome = self.classwork.run(state, ctx).await?;
                Ok(ChatReply {
                    reply: outcome.state.final_response.clone(),
                    ..ChatReply::from_outcome(id, &outcome)
                })
            }
            WorkflowId::Placements(kind) => {
                let message = if message.is_empty() {
                    PLACEMENT_TRIGGER.to_string()
                } else {
                    message
                };
                let graph = self
                    .placements
                    .get(&kind)
                    .ok_or_else(|| RegistryError::UnknownWorkflow(kind.as_str().to_string()))?;
                let state =
                    PlacementsState::new(kind, message).with_user(request.user_id, request.role);
                let outcome = graph.run(state, ctx).await?;
                Ok(ChatReply {
                    reply: outcome.state.response.clone(),
                    validation_status: outcome.state.validation_status,
                    ..ChatReply::from_outcome(id, &outcome)
                })
            }
        }
    }
}

fn require_message(id: WorkflowId, message: &str) -> Result<(), RegistryError> {
    if message.is_empty() {
        Err(RegistryError::EmptyMessage { workflow: id })
    } else {
        Ok(())
    }
}
