//! Output handlers for CLI commands
//!
//! Supports console (pretty), JSON, and quiet output modes.

use crate::registry::ChatReply;
use serde::Serialize;

/// Output mode for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Console,
    Json,
    Quiet,
}

impl OutputMode {
    /// Pick the mode from the global flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if json {
            Self::Json
        } else if quiet {
            Self::Quiet
        } else {
            Self::Console
        }
    }
}

/// Events emitted while a command runs
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum OutputEvent {
    WorkflowStart { name: String },
    WorkflowComplete {
        name: String,
        duration_ms: u64,
        steps: usize,
    },
    WorkflowError { error: String },
    Info { message: String },
    Debug { message: String },
}

/// Output handler trait
pub trait OutputHandler: Send + Sync {
    /// Emit an event
    fn emit(&self, event: OutputEvent);

    /// Write a workflow's reply
    fn reply(&self, reply: &ChatReply);
}

/// Console output handler
pub struct ConsoleHandler {
    debug: bool,
}

impl ConsoleHandler {
    /// Create a new console handler
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    fn format_duration(ms: u64) -> String {
        if ms < 1000 {
            format!("{}ms", ms)
        } else {
            format!("{:.1}s", ms as f64 / 1000.0)
        }
    }
}

impl OutputHandler for ConsoleHandler {
    fn emit(&self, event: OutputEvent) {
        match event {
            OutputEvent::WorkflowStart { name } => {
                eprintln!("Running workflow '{}'", name);
            }
            OutputEvent::WorkflowComplete {
                name,
                duration_ms,
                steps,
            } => {
                eprintln!(
                    "✓ Workflow '{}' completed ({} steps in {})",
                    name,
                    steps,
                    Self::format_duration(duration_ms)
                );
            }
            OutputEvent::WorkflowError { error } => {
                eprintln!("Error: {}", error);
            }
            OutputEvent::Info { message } => {
                eprintln!("{}", message);
            }
            OutputEvent::Debug { message } => {
                if self.debug {
                    eprintln!("[debug] {}", message);
                }
            }
        }
    }

    fn reply(&self, reply: &ChatReply) {
        if let Some(ref route) = reply.route {
            eprintln!("route: {}", route);
        }
        if let Some(status) = reply.validation_status {
            eprintln!("validation: {}", status.as_str());
        }
        if self.debug {
            eprintln!("[debug] steps: {}", reply.steps.join(" -> "));
        }
        match reply.reply {
            Some(ref text) => println!("{}", text),
            None => eprintln!("(no reply)"),
        }
    }
}

/// JSON output handler
pub struct JsonHandler {
    pretty: bool,
}

impl JsonHandler {
    /// Create a new JSON handler
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn print_json<T: Serialize>(&self, value: &T) {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };

        if let Ok(s) = json {
            println!("{}", s);
        }
    }
}

impl OutputHandler for JsonHandler {
    fn emit(&self, event: OutputEvent) {
        // Only errors are interesting next to the reply document
        if matches!(event, OutputEvent::WorkflowError { .. }) {
            self.print_json(&event);
        }
    }

    fn reply(&self, reply: &ChatReply) {
        self.print_json(reply);
    }
}

/// Quiet handler that prints only the reply text
pub struct QuietHandler;

impl OutputHandler for QuietHandler {
    fn emit(&self, _event: OutputEvent) {}

    fn reply(&self, reply: &ChatReply) {
        if let Some(ref text) = reply.reply {
            println!("{}", text);
        }
    }
}

/// Create an output handler based on mode
pub fn create_handler(mode: OutputMode, debug: bool) -> Box<dyn OutputHandler> {
    match mode {
        OutputMode::Console => Box::new(ConsoleHandler::new(debug)),
        OutputMode::Json => Box::new(JsonHandler::new(true)),
        OutputMode::Quiet => Box::new(QuietHandler),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records everything it is handed
    #[derive(Default)]
    pub struct MockHandler {
        events: Mutex<Vec<OutputEvent>>,
        replies: Mutex<Vec<ChatReply>>,
    }

    impl MockHandler {
        pub fn events(&self) -> Vec<OutputEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn messages(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|event| match event {
                    OutputEvent::Info { message } => Some(message),
                    _ => None,
                })
                .collect()
        }

        pub fn replies(&self) -> Vec<ChatReply> {
            self.replies.lock().unwrap().clone()
        }
    }

    impl OutputHandler for MockHandler {
        fn emit(&self, event: OutputEvent) {
            self.events.lock().unwrap().push(event);
        }

        fn reply(&self, reply: &ChatReply) {
            self.replies.lock().unwrap().push(reply.clone());
        }
    }
}
