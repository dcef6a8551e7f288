//! Graph construction and execution errors

use super::step::StepError;
use thiserror::Error;

/// Errors from building or running a workflow graph
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph '{graph}' has no entry step")]
    MissingEntry { graph: String },

    #[error("graph '{graph}': step '{step}' is registered twice")]
    DuplicateStep { graph: String, step: String },

    #[error("graph '{graph}': step '{step}' has more than one outgoing edge")]
    DuplicateEdge { graph: String, step: String },

    #[error("graph '{graph}': '{step}' is not a registered step")]
    UnknownStep { graph: String, step: String },

    #[error("graph '{graph}': step '{step}' has no outgoing edge")]
    MissingEdge { graph: String, step: String },

    #[error(
        "graph '{graph}': conditional edge from '{step}' has no successor for fallback label '{label}'"
    )]
    MissingFallback {
        graph: String,
        step: String,
        label: &'static str,
    },

    #[error("step '{step}' in graph '{graph}' failed: {source}")]
    StepFailed {
        graph: String,
        step: String,
        #[source]
        source: StepError,
    },

    #[error("run of graph '{graph}' was cancelled during step '{step}'")]
    Cancelled { graph: String, step: String },

    #[error("run of graph '{graph}' exceeded its deadline during step '{step}'")]
    DeadlineExceeded { graph: String, step: String },

    #[error("run of graph '{graph}' exceeded the limit of {limit} steps")]
    StepLimitExceeded { graph: String, limit: usize },
}

impl GraphError {
    /// Name of the step the error is attached to, if any
    pub fn step(&self) -> Option<&str> {
        match self {
            GraphError::DuplicateStep { step, .. }
            | GraphError::DuplicateEdge { step, .. }
            | GraphError::UnknownStep { step, .. }
            | GraphError::MissingEdge { step, .. }
            | GraphError::MissingFallback { step, .. }
            | GraphError::StepFailed { step, .. }
            | GraphError::Cancelled { step, .. }
            | GraphError::DeadlineExceeded { step, .. } => Some(step),
            GraphError::MissingEntry { .. } | GraphError::StepLimitExceeded { .. } => None,
        }
    }
}
