//! Narrative insights and the final report

use super::scoring::ScoredStudent;
use std::fmt::Write;

/// Summarize a scored cohort in a few sentences
pub fn synthesize_insights(students: &[ScoredStudent]) -> Vec<String> {
    let critical: Vec<&ScoredStudent> = students.iter().filter(|s| s.is_critical()).collect();

    if !critical.is_empty() {
        let names: Vec<&str> = critical.iter().map(|s| s.record.name.as_str()).collect();
        vec![
            format!(
                "{} students in this group show critical performance drops (Risk Score >= 2).",
                critical.len()
            ),
            format!("Students requiring immediate attention: {}.", names.join(", ")),
        ]
    } else if !students.is_empty() {
        vec!["Overall performance appears stable for this cohort.".to_string()]
    } else {
        vec!["No data found matching the specific criteria.".to_string()]
    }
}

/// Render insights and the student table as markdown
pub fn format_report(insights: &[String], students: &[ScoredStudent]) -> String {
    let mut out = String::from("### Academic Insights\n\n");
    for insight in insights {
        let _ = writeln!(out, "- {insight}");
    }

    out.push_str("\n### Student Details\n");
    out.push_str("| Name | Branch | Attendance | CGPA | Risk Factors |\n");
    out.push_str("|---|---|---|---|---|\n");

    for student in students {
        let reasons = if student.risk_reasons.is_empty() {
            "None".to_string()
        } else {
            student.risk_reasons.join(", ")
        };
        let _ = writeln!(
            out,
            "| {} | {} | {}% | {} | {} |",
            student.record.name,
            student.record.branch,
            student.record.attendance_pct,
            student.record.cumulative_gpa,
            reasons
        );
    }

    out
}
