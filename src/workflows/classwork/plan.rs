//! Execution planning

use super::intent::{FilterKey, FilterValue, Metric, SemanticIntent};
use serde::Serialize;
use std::fmt;

/// Logical dataset a plan reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    StudentMetadata,
    AttendanceTable,
    MarksTable,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::StudentMetadata => "student_metadata",
            Dataset::AttendanceTable => "attendance_table",
            Dataset::MarksTable => "marks_table",
        }
    }

    fn for_metric(metric: Metric) -> Self {
        match metric {
            Metric::AttendancePercentage => Dataset::AttendanceTable,
            Metric::CumulativeGpa => Dataset::MarksTable,
        }
    }
}

/// Operation the plan describes. Informational: execution always applies
/// the intent's filters and then scores and sorts by risk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PlanOperation {
    Filter { key: FilterKey, value: FilterValue },
    GroupBy { key: FilterKey },
    RiskScore,
    SortByRisk,
}

impl fmt::Display for PlanOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanOperation::Filter { key, value } => write!(f, "filter {} = {}", key.as_str(), value),
            PlanOperation::GroupBy { key } => write!(f, "group by {}", key.as_str()),
            PlanOperation::RiskScore => f.write_str("risk score"),
            PlanOperation::SortByRisk => f.write_str("sort by risk"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionPlan {
    pub datasets: Vec<Dataset>,
    pub operations: Vec<PlanOperation>,
}

/// Derive the datasets and operations needed to answer `intent`
pub fn build_plan(intent: &SemanticIntent) -> ExecutionPlan {
    let mut datasets = vec![Dataset::StudentMetadata];
    for metric in &intent.metrics {
        let dataset = Dataset::for_metric(*metric);
        if !datasets.contains(&dataset) {
            datasets.push(dataset);
        }
    }

    let mut operations: Vec<PlanOperation> = intent
        .filters
        .iter()
        .map(|(key, value)| PlanOperation::Filter {
            key: *key,
            value: value.clone(),
        })
        .collect();
    operations.extend(
        intent
            .group_by
            .iter()
            .map(|key| PlanOperation::GroupBy { key: *key }),
    );
    operations.push(PlanOperation::RiskScore);
    operations.push(PlanOperation::SortByRisk);

    ExecutionPlan {
        datasets,
        operations,
    }
}
