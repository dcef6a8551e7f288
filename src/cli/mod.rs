//! CLI module for ace
//!
//! This module provides:
//! - Command implementations (run, workflows, doctor, seed-data)
//! - Output handlers (console, JSON, quiet)
//! - Signal handling for graceful shutdown
//!
//! # Example
//!
//! ```ignore
//! use ace_graphs::cli::{commands, output};
//!
//! let handler = output::create_handler(output::OutputMode::Console, false);
//! let exit_code = commands::run_workflow(&registry, "classwork", request, &ctx, &*handler).await;
//! ```

pub mod commands;
pub mod output;
pub mod signals;

pub use commands::{doctor, list_workflows, run_workflow, seed_data};
pub use output::{OutputEvent, OutputHandler, OutputMode, create_handler};
pub use signals::{is_shutdown_requested, setup_signal_handlers};
