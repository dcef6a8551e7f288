//! Placements assistants
//!
//! Every placement request type runs the same three-step chain: an access
//! gate, a domain agent that writes the response, and a validator that
//! records an advisory verdict on it. The verdict never changes the response.

use crate::classify::Prompter;
use crate::graph::{
    END, Graph, GraphBuilder, GraphError, RunContext, Step, StepError, WorkflowState, assign,
    step_fn,
};
use crate::template::prompts;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Placement request type; each has its own graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementKind {
    Dashboard,
    Resume,
    Prep,
    Shortlisting,
    Tracking,
    Notification,
}

impl PlacementKind {
    pub const ALL: [PlacementKind; 6] = [
        PlacementKind::Dashboard,
        PlacementKind::Resume,
        PlacementKind::Prep,
        PlacementKind::Shortlisting,
        PlacementKind::Tracking,
        PlacementKind::Notification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementKind::Dashboard => "dashboard",
            PlacementKind::Resume => "resume",
            PlacementKind::Prep => "prep",
            PlacementKind::Shortlisting => "shortlisting",
            PlacementKind::Tracking => "tracking",
            PlacementKind::Notification => "notification",
        }
    }

    /// Name of the domain step in this kind's graph
    pub fn agent_step(&self) -> &'static str {
        match self {
            PlacementKind::Dashboard => "dashboard_agent",
            PlacementKind::Resume => "resume_agent",
            PlacementKind::Prep => "prep_agent",
            PlacementKind::Shortlisting => "shortlisting_agent",
            PlacementKind::Tracking => "tracking_agent",
            PlacementKind::Notification => "notification_agent",
        }
    }

    /// Fixed response for templated kinds; `None` for generated ones
    fn canned_response(&self) -> Option<&'static str> {
        match self {
            PlacementKind::Dashboard => Some(
                "Here is your Placement Dashboard: \n- Eligible: 5 Companies\n- Applied: 2\n- Status: In Progress",
            ),
            PlacementKind::Resume => None,
            PlacementKind::Prep => {
                Some("Here are some study materials for your upcoming interview.")
            }
            PlacementKind::Shortlisting => {
                Some("You have been shortlisted for: \n- TechCorp Inc.\n- Global Solutions")
            }
            PlacementKind::Tracking => {
                Some("Tracking Update: Your application to Cloud Systems is 'Under Review'.")
            }
            PlacementKind::Notification => Some("No new notifications at this time."),
        }
    }
}

impl fmt::Display for PlacementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory verdict on a generated response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Approved,
    Rejected,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Approved => "approved",
            ValidationStatus::Rejected => "rejected",
        }
    }

    /// Rejected when the response is missing or mentions "error" in any case
    pub fn judge(response: Option<&str>) -> Self {
        match response {
            Some(text) if !text.to_lowercase().contains("error") => ValidationStatus::Approved,
            _ => ValidationStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlacementsState {
    pub user_id: Option<i64>,
    pub role: Option<String>,
    pub message: String,
    pub intent: Option<PlacementKind>,
    pub authorized: bool,
    pub response: Option<String>,
    pub validation_status: Option<ValidationStatus>,
}

impl PlacementsState {
    pub fn new(kind: PlacementKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            intent: Some(kind),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user_id: Option<i64>, role: Option<String>) -> Self {
        self.user_id = user_id;
        self.role = role;
        self
    }
}

#[derive(Debug, Default)]
pub struct PlacementsUpdate {
    pub authorized: Option<bool>,
    pub response: Option<String>,
    pub validation_status: Option<ValidationStatus>,
}

impl WorkflowState for PlacementsState {
    type Update = PlacementsUpdate;

    fn merge(&mut self, update: PlacementsUpdate) {
        if let Some(authorized) = update.authorized {
            self.authorized = authorized;
        }
        assign(&mut self.response, update.response);
        assign(&mut self.validation_status, update.validation_status);
    }
}

/// Access gate. Authorization is enforced upstream; the gate records the
/// decision so later steps can rely on it.
fn rbac(_state: &PlacementsState) -> Result<PlacementsUpdate, StepError> {
    Ok(PlacementsUpdate {
        authorized: Some(true),
        ..Default::default()
    })
}

fn validator(state: &PlacementsState) -> Result<PlacementsUpdate, StepError> {
    let status = ValidationStatus::judge(state.response.as_deref());
    if status == ValidationStatus::Rejected {
        tracing::warn!(
            intent = ?state.intent,
            "Placement response failed validation"
        );
    }
    Ok(PlacementsUpdate {
        validation_status: Some(status),
        ..Default::default()
    })
}

/// Asks the oracle for a critique of the resume request
struct ResumeAgent {
    prompter: Prompter,
}

#[async_trait]
impl Step<PlacementsState> for ResumeAgent {
    async fn run(
        &self,
        state: &PlacementsState,
        ctx: &RunContext,
    ) -> Result<PlacementsUpdate, StepError> {
        let critique = self
            .prompter
            .ask(prompts::PLACEMENTS_RESUME, &state.message, ctx)
            .await?;
        Ok(PlacementsUpdate {
            response: Some(critique),
            ..Default::default()
        })
    }
}

/// Build the graph for one placement request type
pub fn build(kind: PlacementKind, prompter: Prompter) -> Result<Graph<PlacementsState>, GraphError> {
    let agent = kind.agent_step();
    let builder = GraphBuilder::new(format!("placements/{kind}")).add_step("rbac", step_fn(rbac));

    let builder = match kind.canned_response() {
        Some(text) => builder.add_step(
            agent,
            step_fn(move |_state: &PlacementsState| {
                Ok(PlacementsUpdate {
                    response: Some(text.to_string()),
                    ..Default::default()
                })
            }),
        ),
        None => builder.add_step(agent, ResumeAgent { prompter }),
    };

    builder
        .add_step("validator", step_fn(validator))
        .set_entry("rbac")
        .add_edge("rbac", agent)
        .add_edge(agent, "validator")
        .add_edge("validator", END)
        .compile()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::Oracle;
    use crate::oracle::testing::{DownOracle, ScriptedOracle};
    use crate::template::PromptEngine;
    use std::sync::Arc;

    fn prompter(oracle: impl Oracle + 'static) -> Prompter {
        Prompter::new(Arc::new(oracle), Arc::new(PromptEngine::new()))
    }

    async fn run(kind: PlacementKind, oracle: impl Oracle + 'static) -> PlacementsState {
        build(kind, prompter(oracle))
            .unwrap()
            .run(PlacementsState::new(kind, "trigger"), &RunContext::new())
            .await
            .unwrap()
            .state
    }

    #[test]
    fn test_judge() {
        assert_eq!(
            ValidationStatus::judge(Some("All good")),
            ValidationStatus::Approved
        );
        assert_eq!(ValidationStatus::judge(Some("ERROR")), ValidationStatus::Rejected);
        assert_eq!(
            ValidationStatus::judge(Some("an Error occurred")),
            ValidationStatus::Rejected
        );
        assert_eq!(ValidationStatus::judge(None), ValidationStatus::Rejected);
    }

    #[tokio::test]
    async fn test_every_kind_runs_the_chain() {
        for kind in PlacementKind::ALL {
            let graph = build(kind, prompter(ScriptedOracle::new("Looks solid."))).unwrap();
            let outcome = graph
                .run(PlacementsState::new(kind, "trigger"), &RunContext::new())
                .await
                .unwrap();

            let steps: Vec<&str> = outcome.trace.iter().map(|r| r.step.as_str()).collect();
            assert_eq!(steps, ["rbac", kind.agent_step(), "validator"]);
            assert!(outcome.state.authorized);
            assert!(outcome.state.response.is_some());
            assert_eq!(
                outcome.state.validation_status,
                Some(ValidationStatus::Approved)
            );
        }
    }

    #[tokio::test]
    async fn test_templated_responses() {
        let state = run(PlacementKind::Notification, DownOracle).await;
        assert_eq!(
            state.response.as_deref(),
            Some("No new notifications at this time.")
        );

        let state = run(PlacementKind::Dashboard, DownOracle).await;
        assert_eq!(
            state.response.as_deref(),
            Some(
                "Here is your Placement Dashboard: \n- Eligible: 5 Companies\n- Applied: 2\n- Status: In Progress"
            )
        );
    }

    #[tokio::test]
    async fn test_resume_asks_oracle() {
        let oracle = Arc::new(ScriptedOracle::new(
            "Resume Analysis: formatting looks good, add more metrics to your projects.",
        ));
        let graph = build(
            PlacementKind::Resume,
            Prompter::new(oracle.clone(), Arc::new(PromptEngine::new())),
        )
        .unwrap();
        let state = graph
            .run(
                PlacementsState::new(PlacementKind::Resume, "review my resume"),
                &RunContext::new(),
            )
            .await
            .unwrap()
            .state;

        assert_eq!(
            oracle.prompts(),
            vec!["Analyze this resume request: review my resume. Return a constructive critique."]
        );
        assert!(state.response.unwrap().starts_with("Resume Analysis"));
    }

    #[tokio::test]
    async fn test_validator_rejects_without_altering_response() {
        let state = run(PlacementKind::Resume, ScriptedOracle::new("ERROR")).await;
        assert_eq!(state.response.as_deref(), Some("ERROR"));
        assert_eq!(state.validation_status, Some(ValidationStatus::Rejected));
    }

    #[tokio::test]
    async fn test_resume_oracle_failure_aborts() {
        let err = build(PlacementKind::Resume, prompter(DownOracle))
            .unwrap()
            .run(
                PlacementsState::new(PlacementKind::Resume, "review"),
                &RunContext::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.step(), Some("resume_agent"));
    }
}
