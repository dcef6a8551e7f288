//! Filtering and risk scoring

use super::dataset::StudentRecord;
use super::intent::{FilterKey, FilterValue, SemanticIntent};
use serde::Serialize;

/// Attendance below this percentage is a risk factor
pub const ATTENDANCE_THRESHOLD: f64 = 75.0;

/// GPA below this value is a risk factor
pub const GPA_THRESHOLD: f64 = 6.0;

pub const LOW_ATTENDANCE: &str = "Low Attendance";
pub const LOW_CGPA: &str = "Low CGPA";

/// A record with its risk assessment. `risk_score` always equals the number
/// of `risk_reasons`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredStudent {
    #[serde(flatten)]
    pub record: StudentRecord,
    pub risk_score: u32,
    pub risk_reasons: Vec<String>,
}

impl ScoredStudent {
    /// Apply the risk rules, attendance first
    pub fn assess(record: StudentRecord) -> Self {
        let mut risk_reasons = Vec::new();
        if record.attendance_pct < ATTENDANCE_THRESHOLD {
            risk_reasons.push(LOW_ATTENDANCE.to_string());
        }
        if record.cumulative_gpa < GPA_THRESHOLD {
            risk_reasons.push(LOW_CGPA.to_string());
        }

        Self {
            record,
            risk_score: risk_reasons.len() as u32,
            risk_reasons,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.risk_score >= 2
    }
}

/// Whether `record` satisfies one equality filter; values compare exactly
pub fn matches_filter(record: &StudentRecord, key: FilterKey, value: &FilterValue) -> bool {
    match (key, value) {
        (FilterKey::Branch, FilterValue::Branch(code)) => record.branch == *code,
        (FilterKey::Year, FilterValue::Year(year)) => record.year == *year,
        // A value of the wrong kind never matches
        _ => false,
    }
}

/// Keep the records matching every filter in `intent`, score them, and order
/// them by risk, highest first. Ties keep their dataset order.
pub fn score_students(intent: &SemanticIntent, records: Vec<StudentRecord>) -> Vec<ScoredStudent> {
    let mut scored: Vec<ScoredStudent> = records
        .into_iter()
        .filter(|record| {
            intent
                .filters
                .iter()
                .all(|(key, value)| matches_filter(record, *key, value))
        })
        .map(ScoredStudent::assess)
        .collect();

    // sort_by_key is stable
    scored.sort_by_key(|student| std::cmp::Reverse(student.risk_score));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::classwork::intent::extract_intent;

    fn student(id: u32, branch: &str, year: u8, attendance: f64, gpa: f64) -> StudentRecord {
        StudentRecord {
            id,
            name: format!("S{id}"),
            branch: branch.into(),
            year,
            attendance_pct: attendance,
            cumulative_gpa: gpa,
            email: format!("s{id}@vnr.edu.in"),
        }
    }

    #[test]
    fn test_one_risk_factor() {
        let scored = ScoredStudent::assess(student(1, "CSE", 2, 74.0, 6.5));
        assert_eq!(scored.risk_score, 1);
        assert_eq!(scored.risk_reasons, vec!["Low Attendance"]);
    }

    #[test]
    fn test_both_risk_factors_in_rule_order() {
        let scored = ScoredStudent::assess(student(1, "CSE", 2, 74.0, 5.9));
        assert_eq!(scored.risk_score, 2);
        assert_eq!(scored.risk_reasons, vec!["Low Attendance", "Low CGPA"]);
        assert!(scored.is_critical());
    }

    #[test]
    fn test_thresholds_are_strict() {
        let scored = ScoredStudent::assess(student(1, "CSE", 2, 75.0, 6.0));
        assert_eq!(scored.risk_score, 0);
        assert!(scored.risk_reasons.is_empty());

        let scored = ScoredStudent::assess(student(1, "CSE", 2, 90.0, 5.0));
        assert_eq!(scored.risk_reasons, vec!["Low CGPA"]);
    }

    #[test]
    fn test_branch_filter() {
        let records = vec![
            student(1, "CSE", 1, 90.0, 8.0),
            student(2, "ECE", 1, 90.0, 8.0),
            student(3, "CSE", 3, 90.0, 8.0),
            student(4, "IT", 2, 90.0, 8.0),
        ];
        let scored = score_students(&extract_intent("cse students"), records);
        let ids: Vec<u32> = scored.iter().map(|s| s.record.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(scored.iter().all(|s| s.record.branch == "CSE"));
    }

    #[test]
    fn test_branch_and_year_filter() {
        let records = vec![
            student(1, "CSE", 2, 90.0, 8.0),
            student(2, "CSE", 3, 90.0, 8.0),
            student(3, "CSE", 2, 60.0, 8.0),
        ];
        let scored = score_students(&extract_intent("CSE 2nd year"), records);
        let ids: Vec<u32> = scored.iter().map(|s| s.record.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_branch_filter_is_exact() {
        let records = vec![
            student(1, "CSE", 1, 90.0, 8.0),
            student(2, "cse", 1, 90.0, 8.0),
            student(3, "Cse", 1, 90.0, 8.0),
        ];
        let scored = score_students(&extract_intent("CSE students"), records);
        let ids: Vec<u32> = scored.iter().map(|s| s.record.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_stable_sort_by_risk() {
        // risk scores [0, 2, 1, 2]
        let records = vec![
            student(0, "CSE", 1, 90.0, 8.0),
            student(1, "CSE", 1, 60.0, 5.0),
            student(2, "CSE", 1, 60.0, 8.0),
            student(3, "CSE", 1, 60.0, 5.0),
        ];
        let scored = score_students(&SemanticIntent::default(), records);
        let ids: Vec<u32> = scored.iter().map(|s| s.record.id).collect();
        assert_eq!(ids, vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_score_matches_reason_count() {
        let records = (0..20)
            .map(|i| student(i, "IT", 1, 60.0 + f64::from(i) * 2.0, 4.5 + f64::from(i) * 0.2))
            .collect();
        for scored in score_students(&SemanticIntent::default(), records) {
            assert_eq!(scored.risk_score as usize, scored.risk_reasons.len());
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(score_students(&SemanticIntent::default(), Vec::new()).is_empty());
    }
}
