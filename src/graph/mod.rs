//! Step-graph execution engine
//!
//! A workflow is a set of named steps joined by edges. Every step reads the
//! run's state and returns a partial update; the engine merges the update and
//! follows the step's single outgoing edge, which is either unconditional or
//! dispatched on a [`Label`] computed from the state.
//!
//! Graphs are built once with [`GraphBuilder`], compiled into an immutable
//! [`Graph`] and shared behind an `Arc` by every concurrent run.
//!
//! # Example
//!
//! ```ignore
//! use ace_graphs::graph::{GraphBuilder, RunContext, END, step_fn};
//!
//! let graph = GraphBuilder::new("greeting")
//!     .add_step("hello", step_fn(|s: &Greeting| Ok(GreetingUpdate::reply("hi"))))
//!     .set_entry("hello")
//!     .add_edge("hello", END)
//!     .compile()?;
//!
//! let outcome = graph.run(Greeting::default(), &RunContext::new()).await?;
//! ```

mod builder;
mod cancel;
mod context;
mod edge;
mod error;
mod runner;
mod state;
mod step;

pub use builder::GraphBuilder;
pub use cancel::CancellationToken;
pub use context::RunContext;
pub use edge::{Label, Target};
pub use error::GraphError;
pub use runner::{Graph, RunOutcome, StepRecord};
pub use state::{WorkflowState, assign};
pub use step::{FnStep, Step, StepError, step_fn};

/// Name of the terminal marker. An edge into `END` finishes the run.
pub const END: &str = "__end__";
