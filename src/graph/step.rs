//! Step trait and step errors

use super::context::RunContext;
use super::state::WorkflowState;
use crate::oracle::OracleError;
use crate::template::TemplateError;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised inside a step. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("oracle call failed: {0}")]
    Oracle(#[from] OracleError),

    #[error("prompt rendering failed: {0}")]
    Template(#[from] TemplateError),

    #[error("state field '{field}' was not set by an earlier step")]
    MissingField { field: &'static str },

    #[error("{message}")]
    Failed { message: String },
}

impl StepError {
    /// Create a missing-field error
    pub fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Create a generic failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// A unit of computation in a workflow graph.
///
/// A step receives the current state read-only and returns the partial update
/// the engine merges into it. A step must only rely on the fields it reads
/// itself; anything else may be unset.
#[async_trait]
pub trait Step<S: WorkflowState>: Send + Sync {
    async fn run(&self, state: &S, ctx: &RunContext) -> Result<S::Update, StepError>;
}

/// Step backed by a synchronous function
pub struct FnStep<F> {
    f: F,
}

/// Wrap a synchronous function as a [`Step`].
pub fn step_fn<S, F>(f: F) -> FnStep<F>
where
    S: WorkflowState,
    F: Fn(&S) -> Result<S::Update, StepError> + Send + Sync,
{
    FnStep { f }
}

#[async_trait]
impl<S, F> Step<S> for FnStep<F>
where
    S: WorkflowState,
    F: Fn(&S) -> Result<S::Update, StepError> + Send + Sync,
{
    async fn run(&self, state: &S, _ctx: &RunContext) -> Result<S::Update, StepError> {
        (self.f)(state)
    }
}
