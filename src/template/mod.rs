//! Prompt templating
//!
//! Prompts sent to the oracle are Jinja2-compatible templates rendered with
//! minijinja. Every built-in prompt is registered under a `<workflow>/<step>`
//! name (see [`prompts`]); classification prompts receive `message` and
//! `labels`, generation prompts receive `message`.
//!
//! # Example
//!
//! ```ignore
//! use ace_graphs::template::{prompts, PromptEngine};
//!
//! let engine = PromptEngine::new();
//! let prompt = engine.render(
//!     prompts::ADMISSIONS_FAQ,
//!     minijinja::context! { message => "What is the fee structure?" },
//! )?;
//! ```

mod engine;
mod errors;
pub mod prompts;

pub use engine::PromptEngine;
pub use errors::{SourceLocation, TemplateError};
