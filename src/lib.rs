//! Step-graph workflows for campus assistants
//!
//! A small graph engine ([`graph`]) runs typed workflow state through async
//! steps with static and conditional edges. The [`workflows`] built on it are
//! exposed through the [`registry`] and the `ace` binary.

pub mod classify;
pub mod cli;
pub mod config;
pub mod graph;
pub mod logging;
pub mod oracle;
pub mod registry;
pub mod template;
pub mod workflows;
