//! Admissions assistant
//!
//! A supervisor classifies the message into one of four routes and hands it
//! to the matching agent. Department queries are classified a second time to
//! name the department that should handle them.

use crate::classify::{Classifier, Prompter};
use crate::graph::{
    END, Graph, GraphBuilder, GraphError, Label, RunContext, Step, StepError, WorkflowState,
    assign,
};
use crate::template::prompts;
use async_trait::async_trait;
use serde::Serialize;

/// Route chosen by the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Faq,
    ApplicationTracking,
    DepartmentQuery,
    AdminAction,
}

impl Label for Route {
    const ALL: &'static [Self] = &[
        Route::Faq,
        Route::ApplicationTracking,
        Route::DepartmentQuery,
        Route::AdminAction,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Route::Faq => "faq",
            Route::ApplicationTracking => "application_tracking",
            Route::DepartmentQuery => "department_query",
            Route::AdminAction => "admin_action",
        }
    }
}

/// Department a query belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    Cse,
    It,
    Ece,
    Eee,
    Mechanical,
    Civil,
    NotDepartment,
}

impl Label for Department {
    const ALL: &'static [Self] = &[
        Department::Cse,
        Department::It,
        Department::Ece,
        Department::Eee,
        Department::Mechanical,
        Department::Civil,
        Department::NotDepartment,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Department::Cse => "cse",
            Department::It => "it",
            Department::Ece => "ece",
            Department::Eee => "eee",
            Department::Mechanical => "mechanical",
            Department::Civil => "civil",
            Department::NotDepartment => "not_department",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdmissionsState {
    pub user_id: Option<i64>,
    pub role_id: Option<i64>,
    pub message: String,
    pub reply: Option<String>,
    pub route: Option<Route>,
}

impl AdmissionsState {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user_id: Option<i64>, role_id: Option<i64>) -> Self {
        self.user_id = user_id;
        self.role_id = role_id;
        self
    }
}

#[derive(Debug, Default)]
pub struct AdmissionsUpdate {
    pub reply: Option<String>,
    pub route: Option<Route>,
}

impl WorkflowState for AdmissionsState {
    type Update = AdmissionsUpdate;

    fn merge(&mut self, update: AdmissionsUpdate) {
        assign(&mut self.reply, update.reply);
        assign(&mut self.route, update.route);
    }
}

struct Supervisor {
    classifier: Classifier<Route>,
}

#[async_trait]
impl Step<AdmissionsState> for Supervisor {
    async fn run(
        &self,
        state: &AdmissionsState,
        ctx: &RunContext,
    ) -> Result<AdmissionsUpdate, StepError> {
        let route = self.classifier.classify(&state.message, ctx).await?;
        Ok(AdmissionsUpdate {
            route: Some(route),
            ..Default::default()
        })
    }
}

/// Answers the message with a generated reply
struct Agent {
    prompter: Prompter,
    template: &'static str,
}

#[async_trait]
impl Step<AdmissionsState> for Agent {
    async fn run(
        &self,
        state: &AdmissionsState,
        ctx: &RunContext,
    ) -> Result<AdmissionsUpdate, StepError> {
        let reply = self.prompter.ask(self.template, &state.message, ctx).await?;
        Ok(AdmissionsUpdate {
            reply: Some(reply),
            ..Default::default()
        })
    }
}

struct DepartmentRouter {
    classifier: Classifier<Department>,
}

#[async_trait]
impl Step<AdmissionsState> for DepartmentRouter {
    async fn run(
        &self,
        state: &AdmissionsState,
        ctx: &RunContext,
    ) -> Result<AdmissionsUpdate, StepError> {
        let department = self.classifier.classify(&state.message, ctx).await?;
        Ok(AdmissionsUpdate {
            reply: Some(format!(
                "This will be routed to department: {}",
                department.as_str()
            )),
            ..Default::default()
        })
    }
}

/// Build the admissions graph
pub fn build(prompter: Prompter) -> Result<Graph<AdmissionsState>, GraphError> {
    let agent = |template| Agent {
        prompter: prompter.clone(),
        template,
    };

    GraphBuilder::new("admissions")
        .add_step(
            "supervisor",
            Supervisor {
                classifier: Classifier::new(
                    prompter.clone(),
                    prompts::ADMISSIONS_SUPERVISOR,
                    Route::Faq,
                ),
            },
        )
        .add_step(Route::Faq.as_str(), agent(prompts::ADMISSIONS_FAQ))
        .add_step(
            Route::ApplicationTracking.as_str(),
            agent(prompts::ADMISSIONS_TRACKING),
        )
        .add_step(
            Route::DepartmentQuery.as_str(),
            DepartmentRouter {
                classifier: Classifier::new(
                    prompter.clone(),
                    prompts::ADMISSIONS_DEPARTMENT,
                    Department::NotDepartment,
                ),
            },
        )
        .add_step(Route::AdminAction.as_str(), agent(prompts::ADMISSIONS_ADMIN))
        .set_entry("supervisor")
        .add_conditional_edge(
            "supervisor",
            |state: &AdmissionsState| state.route.unwrap_or(Route::Faq),
            Route::ALL.iter().map(|route| (*route, route.as_str())),
            Route::Faq,
        )
        .add_edge(Route::Faq.as_str(), END)
        .add_edge(Route::ApplicationTracking.as_str(), END)
        .add_edge(Route::DepartmentQuery.as_str(), END)
        .add_edge(Route::AdminAction.as_str(), END)
        .compile()
}
