//! Academic query pipeline
//!
//! Turns a natural-language question about a student cohort into a ranked,
//! risk-annotated markdown report. Eight steps run in a fixed line:
//!
//! ```text
//! ingestion -> normalization -> intent_extraction -> plan_construction
//!   -> data_retrieval -> risk_scoring -> insight_synthesis -> response_formatting
//! ```
//!
//! Everything except data retrieval is deterministic. Retrieval fails open:
//! an unreadable source yields an empty cohort and a "no data" report.

pub mod dataset;
pub mod insight;
pub mod intent;
pub mod normalize;
pub mod plan;
pub mod scoring;

pub use dataset::{
    DataSourceError, JsonFileSource, MemorySource, SEED_COUNT, StudentRecord, StudentSource,
    seed_students, write_students,
};
pub use insight::{format_report, synthesize_insights};
pub use intent::{FilterKey, FilterValue, Metric, SemanticIntent, extract_intent};
pub use normalize::{NormalizationError, Normalizer};
pub use plan::{Dataset, ExecutionPlan, PlanOperation, build_plan};
pub use scoring::{ScoredStudent, score_students};

use crate::graph::{
    END, Graph, GraphBuilder, GraphError, RunContext, Step, StepError, WorkflowState, assign,
    step_fn,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const STEPS: [&str; 8] = [
    "ingestion",
    "normalization",
    "intent_extraction",
    "plan_construction",
    "data_retrieval",
    "risk_scoring",
    "insight_synthesis",
    "response_formatting",
];

#[derive(Debug, Clone, Default)]
pub struct ClassworkState {
    pub user_query: String,
    pub role: Option<String>,
    pub context: Map<String, Value>,
    pub normalized_query: Option<String>,
    pub semantic_intent: Option<SemanticIntent>,
    pub execution_plan: Option<ExecutionPlan>,
    pub unified_dataset: Option<Vec<StudentRecord>>,
    pub scored_students: Option<Vec<ScoredStudent>>,
    pub insights: Option<Vec<String>>,
    pub final_response: Option<String>,
}

impl ClassworkState {
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            user_query: user_query.into(),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Default)]
pub struct ClassworkUpdate {
    pub context: Option<Map<String, Value>>,
    pub normalized_query: Option<String>,
    pub semantic_intent: Option<SemanticIntent>,
    pub execution_plan: Option<ExecutionPlan>,
    pub unified_dataset: Option<Vec<StudentRecord>>,
    pub scored_students: Option<Vec<ScoredStudent>>,
    pub insights: Option<Vec<String>>,
    pub final_response: Option<String>,
}

impl WorkflowState for ClassworkState {
    type Update = ClassworkUpdate;

    fn merge(&mut self, update: ClassworkUpdate) {
        if let Some(context) = update.context {
            self.context = context;
        }
        assign(&mut self.normalized_query, update.normalized_query);
        assign(&mut self.semantic_intent, update.semantic_intent);
        assign(&mut self.execution_plan, update.execution_plan);
        assign(&mut self.unified_dataset, update.unified_dataset);
        assign(&mut self.scored_students, update.scored_students);
        assign(&mut self.insights, update.insights);
        assign(&mut self.final_response, update.final_response);
    }
}

fn ingest(state: &ClassworkState) -> Result<ClassworkUpdate, StepError> {
    debug!(query = %state.user_query, role = ?state.role, "Received academic query");
    let mut context = state.context.clone();
    context
        .entry("timestamp")
        .or_insert_with(|| Value::String(chrono::Utc::now().to_rfc3339()));
    Ok(ClassworkUpdate {
        context: Some(context),
        ..Default::default()
    })
}

fn extract(state: &ClassworkState) -> Result<ClassworkUpdate, StepError> {
    let query = state
        .normalized_query
        .as_deref()
        .ok_or_else(|| StepError::missing("normalized_query"))?;
    let intent = extract_intent(query);
    debug!(?intent, "Mapped query to schema");
    Ok(ClassworkUpdate {
        semantic_intent: Some(intent),
        ..Default::default()
    })
}

fn plan_query(state: &ClassworkState) -> Result<ClassworkUpdate, StepError> {
    let intent = state
        .semantic_intent
        .as_ref()
        .ok_or_else(|| StepError::missing("semantic_intent"))?;
    let plan = build_plan(intent);
    debug!(
        datasets = ?plan.datasets.iter().map(Dataset::as_str).collect::<Vec<_>>(),
        operations = plan.operations.len(),
        "Built execution plan"
    );
    Ok(ClassworkUpdate {
        execution_plan: Some(plan),
        ..Default::default()
    })
}

fn score(state: &ClassworkState) -> Result<ClassworkUpdate, StepError> {
    let intent = state
        .semantic_intent
        .as_ref()
        .ok_or_else(|| StepError::missing("semantic_intent"))?;
    let records = state
        .unified_dataset
        .clone()
        .ok_or_else(|| StepError::missing("unified_dataset"))?;

    let total = records.len();
    let scored = score_students(intent, records);
    debug!(total, kept = scored.len(), "Filtered and scored students");
    Ok(ClassworkUpdate {
        scored_students: Some(scored),
        ..Default::default()
    })
}

fn summarize(state: &ClassworkState) -> Result<ClassworkUpdate, StepError> {
    let students = state
        .scored_students
        .as_deref()
        .ok_or_else(|| StepError::missing("scored_students"))?;
    Ok(ClassworkUpdate {
        insights: Some(synthesize_insights(students)),
        ..Default::default()
    })
}

fn render_report(state: &ClassworkState) -> Result<ClassworkUpdate, StepError> {
    let insights = state
        .insights
        .as_deref()
        .ok_or_else(|| StepError::missing("insights"))?;
    let students = state
        .scored_students
        .as_deref()
        .ok_or_else(|| StepError::missing("scored_students"))?;
    Ok(ClassworkUpdate {
        final_response: Some(format_report(insights, students)),
        ..Default::default()
    })
}

/// Loads the cohort from the configured source
struct FetchData {
    source: Arc<dyn StudentSource>,
}

#[async_trait]
impl Step<ClassworkState> for FetchData {
    async fn run(
        &self,
        state: &ClassworkState,
        _ctx: &RunContext,
    ) -> Result<ClassworkUpdate, StepError> {
        if let Some(ref plan) = state.execution_plan {
            debug!(datasets = plan.datasets.len(), "Fetching datasets");
        }

        let records = match self.source.load().await {
            Ok(records) => {
                info!(
                    source = %self.source.describe(),
                    records = records.len(),
                    "Loaded student data"
                );
                records
            }
            Err(err) => {
                warn!(error = %err, "Student data unavailable, continuing with no records");
                Vec::new()
            }
        };

        Ok(ClassworkUpdate {
            unified_dataset: Some(records),
            ..Default::default()
        })
    }
}

/// Build the academic query graph
pub fn build(
    normalizer: Normalizer,
    source: Arc<dyn StudentSource>,
) -> Result<Graph<ClassworkState>, GraphError> {
    let normalize = move |state: &ClassworkState| -> Result<ClassworkUpdate, StepError> {
        let normalized = normalizer.normalize(&state.user_query);
        debug!(normalized = %normalized, "Normalized query");
        Ok(ClassworkUpdate {
            normalized_query: Some(normalized),
            ..Default::default()
        })
    };

    let builder = GraphBuilder::new("classwork")
        .add_step(STEPS[0], step_fn(ingest))
        .add_step(STEPS[1], step_fn(normalize))
        .add_step(STEPS[2], step_fn(extract))
        .add_step(STEPS[3], step_fn(plan_query))
        .add_step(STEPS[4], FetchData { source })
        .add_step(STEPS[5], step_fn(score))
        .add_step(STEPS[6], step_fn(summarize))
        .add_step(STEPS[7], step_fn(render_report))
        .set_entry(STEPS[0]);

    STEPS
        .iter()
        .zip(STEPS.iter().skip(1).copied().chain([END]))
        .fold(builder, |builder, (from, to)| builder.add_edge(*from, to))
        .compile()
}
