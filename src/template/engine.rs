//! Prompt rendering engine

use super::errors::{SourceLocation, TemplateError};
use super::prompts::BUILTIN_PROMPTS;
use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use serde::Serialize;

/// Prompt rendering engine
///
/// Wraps minijinja with strict undefined handling and the built-in prompt
/// table preloaded.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptEngine {
    /// Create an engine without any registered prompts
    pub fn empty() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        Self { env }
    }

    /// Create an engine with every built-in prompt registered
    pub fn new() -> Self {
        let mut engine = Self::empty();
        for &(name, source) in BUILTIN_PROMPTS {
            if let Err(err) = engine.env.add_template(name, source) {
                // Built-in prompts are checked by the tests below
                tracing::error!(template = name, error = %err, "Invalid built-in prompt");
            }
        }
        engine
    }

    /// Register (or replace) a named prompt
    pub fn add_prompt(&mut self, name: &str, source: &str) -> Result<(), TemplateError> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())
            .map_err(|e| convert_minijinja_error(e, name, &[]))
    }

    /// Whether a prompt is registered under `name`
    pub fn has_prompt(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    /// Render a registered prompt with the given context
    ///
    /// # Example
    ///
    /// ```ignore
    /// let engine = PromptEngine::new();
    /// let prompt = engine.render("admissions/faq", minijinja::context! { message => "Fees?" })?;
    /// ```
    pub fn render<C: Serialize>(&self, name: &str, ctx: C) -> Result<String, TemplateError> {
        let tmpl = self.env.get_template(name).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => TemplateError::UnknownTemplate {
                name: name.to_string(),
            },
            _ => TemplateError::Internal(e),
        })?;

        let known = known_variables(&ctx);
        let known: Vec<&str> = known.iter().map(String::as_str).collect();
        tmpl.render(ctx)
            .map(|s| s.trim().to_string())
            .map_err(|e| convert_minijinja_error(e, name, &known))
    }
}

/// Top-level keys of a serialized context, used for typo suggestions
fn known_variables<C: Serialize>(ctx: &C) -> Vec<String> {
    match serde_json::to_value(ctx) {
        Ok(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

fn convert_minijinja_error(err: minijinja::Error, name: &str, known: &[&str]) -> TemplateError {
    let location = SourceLocation {
        line: err.line().unwrap_or(0),
        template_name: Some(name.to_string()),
    };

    match err.kind() {
        ErrorKind::UndefinedError => {
            let var_name = extract_var_from_error(&err.to_string());
            TemplateError::undefined_variable_at(var_name, location, known)
        }
        ErrorKind::SyntaxError => TemplateError::syntax(err.to_string(), location),
        _ => TemplateError::Internal(err),
    }
}

/// Extract variable name from a minijinja error message
fn extract_var_from_error(msg: &str) -> String {
    // Messages look like: "undefined value (in faq:3): variable is `mesage`"
    msg.find('`')
        .and_then(|start| {
            let rest = &msg[start + 1..];
            rest.find('`').map(|end| rest[..end].to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
