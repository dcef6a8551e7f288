//! Query normalization
//!
//! Expands shorthand in academic queries with a table of `pattern ->
//! replacement` rules. Patterns match case-insensitively, on a word boundary
//! wherever the pattern starts or ends with a word character, and runs of
//! whitespace inside a pattern match any whitespace. Text outside a match is
//! left as typed.
//!
//! A replacement can combine with the text around it into another pattern,
//! so the table is applied until the text stops changing.

use crate::config::NormalizationConfig;
use regex::{NoExpand, Regex};
use thiserror::Error;
use tracing::warn;

/// Built-in shorthand rules
pub const DEFAULT_RULES: &[(&str, &str)] = &[
    ("low att", "low attendance"),
    ("1st yr", "1st year"),
    ("2nd yr", "2nd year"),
    ("3rd yr", "3rd year"),
    ("4th yr", "4th year"),
];

#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("normalization pattern must not be empty")]
    EmptyPattern,

    #[error("invalid normalization pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Applying the table twice would change the text again
    #[error("replacement '{replacement}' would be rewritten again by pattern '{conflicting}'")]
    Unstable {
        replacement: String,
        conflicting: String,
    },
}

/// Passes after which a still-changing text is returned as is
const MAX_PASSES: usize = 16;

#[derive(Debug)]
struct Rule {
    pattern: String,
    regex: Regex,
    replacement: String,
}

/// Ordered substitution table
#[derive(Debug)]
pub struct Normalizer {
    rules: Vec<Rule>,
}

impl Normalizer {
    /// Build a table from `rules`, applied in order
    ///
    /// Rejects any rule whose replacement on its own contains a match for a
    /// pattern in the table, its own included.
    pub fn new<I, P, R>(rules: I) -> Result<Self, NormalizationError>
    where
        I: IntoIterator<Item = (P, R)>,
        P: Into<String>,
        R: Into<String>,
    {
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| compile_rule(pattern.into(), replacement.into()))
            .collect::<Result<Vec<_>, _>>()?;

        for rule in &rules {
            if let Some(conflict) = rules.iter().find(|other| other.regex.is_match(&rule.replacement))
            {
                return Err(NormalizationError::Unstable {
                    replacement: rule.replacement.clone(),
                    conflicting: conflict.pattern.clone(),
                });
            }
        }

        Ok(Self { rules })
    }

    /// Built-in rules followed by the configured ones
    pub fn from_config(config: &NormalizationConfig) -> Result<Self, NormalizationError> {
        let configured = config
            .rules
            .iter()
            .map(|rule| (rule.pattern.as_str(), rule.replacement.as_str()));
        Self::new(DEFAULT_RULES.iter().copied().chain(configured))
    }

    /// Rewrite every shorthand occurrence in `query`
    ///
    /// The result is a fixed point of the table: normalizing it again returns
    /// it unchanged.
    pub fn normalize(&self, query: &str) -> String {
        let mut text = query.to_string();
        for _ in 0..MAX_PASSES {
            let next = self.apply(&text);
            if next == text {
                return text;
            }
            text = next;
        }
        warn!(query, "Normalization did not settle");
        text
    }

    fn apply(&self, text: &str) -> String {
        self.rules.iter().fold(text.to_string(), |text, rule| {
            rule.regex
                .replace_all(&text, NoExpand(&rule.replacement))
                .into_owned()
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn compile_rule(pattern: String, replacement: String) -> Result<Rule, NormalizationError> {
    let words: Vec<String> = pattern.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return Err(NormalizationError::EmptyPattern);
    }

    let starts_word = pattern.trim_start().starts_with(is_word_char);
    let ends_word = pattern.trim_end().ends_with(is_word_char);
    let source = format!(
        r"(?i){}{}{}",
        if starts_word { r"\b" } else { "" },
        words.join(r"\s+"),
        if ends_word { r"\b" } else { "" },
    );
    let regex = Regex::new(&source).map_err(|source| NormalizationError::InvalidPattern {
        pattern: pattern.clone(),
        source,
    })?;

    Ok(Rule {
        pattern,
        regex,
        replacement,
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
