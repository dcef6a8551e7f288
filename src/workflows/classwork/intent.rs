//! Semantic intent extraction
//!
//! Maps a normalized query onto the academic schema with keyword rules. The
//! query is split into word tokens, so short codes such as `it` only match a
//! whole word. Since `it` is also a pronoun, it names the branch only when
//! typed as `IT` or written next to a word like `students` or `branch`.
//! Filters are equality filters; when a query names the same key twice, the
//! first mention wins.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Measured quantity a query asks about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    AttendancePercentage,
    CumulativeGpa,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::AttendancePercentage => "attendance_percentage",
            Metric::CumulativeGpa => "cumulative_gpa",
        }
    }
}

/// Student attribute usable as a filter or grouping key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey {
    Branch,
    Year,
}

impl FilterKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKey::Branch => "branch",
            FilterKey::Year => "year",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Upper-case branch code, e.g. `CSE`
    Branch(String),
    /// Year of study, 1 to 4
    Year(u8),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Branch(code) => f.write_str(code),
            FilterValue::Year(year) => write!(f, "{year}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SemanticIntent {
    pub metrics: BTreeSet<Metric>,
    pub filters: BTreeMap<FilterKey, FilterValue>,
    pub group_by: Vec<FilterKey>,
}

const GPA_WORDS: &[&str] = &["cgpa", "gpa", "grades", "grade", "marks"];

const BRANCH_CODES: &[(&str, &str)] = &[
    ("cse", "CSE"),
    ("it", "IT"),
    ("ece", "ECE"),
    ("eee", "EEE"),
    ("mech", "MECH"),
    ("mechanical", "MECH"),
    ("civil", "CIVIL"),
];

/// Words that mark a neighbouring `it` as the branch
const BRANCH_CONTEXT_WORDS: &[&str] = &[
    "branch",
    "department",
    "dept",
    "student",
    "students",
];

const YEAR_WORDS: &[(&str, u8)] = &[
    ("1st", 1),
    ("first", 1),
    ("2nd", 2),
    ("second", 2),
    ("3rd", 3),
    ("third", 3),
    ("4th", 4),
    ("fourth", 4),
];

/// Extract metrics, filters and grouping from a normalized query
pub fn extract_intent(query: &str) -> SemanticIntent {
    let typed: Vec<&str> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();
    let lowered: Vec<String> = typed.iter().map(|token| token.to_lowercase()).collect();
    let tokens: Vec<&str> = lowered.iter().map(String::as_str).collect();

    let mut intent = SemanticIntent::default();

    for (i, token) in tokens.iter().copied().enumerate() {
        let next = tokens.get(i + 1).copied();

        if token == "attendance" {
            intent.metrics.insert(Metric::AttendancePercentage);
        }
        if GPA_WORDS.contains(&token) {
            intent.metrics.insert(Metric::CumulativeGpa);
        }

        if let Some(code) = branch_code(token)
            .filter(|&code| code != "IT" || names_it_branch(&typed, &tokens, i))
        {
            intent
                .filters
                .entry(FilterKey::Branch)
                .or_insert_with(|| FilterValue::Branch(code.to_string()));
        }

        if let Some(year) = year_number(token) {
            if next.is_some_and(|word| word == "year" || word == "years") {
                intent
                    .filters
                    .entry(FilterKey::Year)
                    .or_insert(FilterValue::Year(year));
            }
        }

        if token == "by" || token == "per" {
            let key = match next {
                Some("branch" | "department" | "dept") => Some(FilterKey::Branch),
                Some("year") => Some(FilterKey::Year),
                _ => None,
            };
            if let Some(key) = key {
                if !intent.group_by.contains(&key) {
                    intent.group_by.push(key);
                }
            }
        }
    }

    intent
}

fn branch_code(token: &str) -> Option<&'static str> {
    BRANCH_CODES
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, code)| *code)
}

fn names_it_branch(typed: &[&str], tokens: &[&str], i: usize) -> bool {
    if typed[i] == "IT" {
        return true;
    }
    let before = i.checked_sub(1).and_then(|j| tokens.get(j));
    let after = tokens.get(i + 1);
    [before, after]
        .into_iter()
        .flatten()
        .any(|word| BRANCH_CONTEXT_WORDS.contains(word))
}

fn year_number(token: &str) -> Option<u8> {
    YEAR_WORDS
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, year)| *year)
}
