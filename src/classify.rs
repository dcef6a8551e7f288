//! Oracle-backed generation and classification
//!
//! [`Prompter`] renders a built-in prompt and returns the oracle's reply.
//! [`Classifier`] builds on it to turn a reply into a member of a closed
//! [`Label`] set: the reply is trimmed and lower-cased, and anything outside
//! the set becomes the classifier's default label. Only the normalized label
//! is ever written to workflow state.

use crate::graph::{Label, RunContext, StepError};
use crate::oracle::{Oracle, OracleRequest};
use crate::template::PromptEngine;
use minijinja::context;
use std::sync::Arc;
use tracing::{debug, warn};

/// Renders prompts and sends them to the oracle
#[derive(Clone)]
pub struct Prompter {
    oracle: Arc<dyn Oracle>,
    prompts: Arc<PromptEngine>,
}

impl Prompter {
    pub fn new(oracle: Arc<dyn Oracle>, prompts: Arc<PromptEngine>) -> Self {
        Self { oracle, prompts }
    }

    pub fn oracle(&self) -> &Arc<dyn Oracle> {
        &self.oracle
    }

    /// Render `template` for `message` and return the raw completion text
    pub async fn ask(
        &self,
        template: &str,
        message: &str,
        ctx: &RunContext,
    ) -> Result<String, StepError> {
        let prompt = self.prompts.render(template, context! { message => message })?;
        self.send(template, prompt, ctx).await
    }

    async fn send(
        &self,
        template: &str,
        prompt: String,
        ctx: &RunContext,
    ) -> Result<String, StepError> {
        let request = OracleRequest::new(prompt).with_timeout_cap(ctx.remaining());
        let completion = self.oracle.complete(&request).await?;
        debug!(
            oracle = %completion.oracle,
            model = completion.model.as_deref().unwrap_or("-"),
            template,
            duration_ms = completion.duration.as_millis() as u64,
            "Oracle replied"
        );
        Ok(completion.text)
    }
}

/// Classifies messages into a closed label set
pub struct Classifier<L: Label> {
    prompter: Prompter,
    template: &'static str,
    default: L,
}

impl<L: Label> Classifier<L> {
    /// `template` receives `message` and `labels`; `default` replaces any
    /// reply outside the label set
    pub fn new(prompter: Prompter, template: &'static str, default: L) -> Self {
        Self {
            prompter,
            template,
            default,
        }
    }

    pub fn default_label(&self) -> L {
        self.default
    }

    /// Map a raw oracle reply onto the label set
    pub fn parse(&self, raw: &str) -> L {
        let normalized = raw.trim().to_lowercase();
        match L::from_name(&normalized) {
            Some(label) => label,
            None => {
                warn!(
                    reply = %normalized,
                    default = self.default.as_str(),
                    "Unrecognized classification, using default label"
                );
                self.default
            }
        }
    }

    /// Ask the oracle to classify `message`
    pub async fn classify(&self, message: &str, ctx: &RunContext) -> Result<L, StepError> {
        let labels: Vec<&str> = L::ALL.iter().map(|label| label.as_str()).collect();
        let prompt = self
            .prompter
            .prompts
            .render(self.template, context! { message => message, labels => labels })?;
        let reply = self.prompter.send(self.template, prompt, ctx).await?;
        let label = self.parse(&reply);
        debug!(label = label.as_str(), template = self.template, "Classified");
        Ok(label)
    }
}
