//! Per-run execution context: deadline, cancellation and step limit

use super::cancel::CancellationToken;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Why a step future was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interrupt {
    Cancelled,
    DeadlineExceeded,
}

/// Context handed to every step of one run.
///
/// The engine races each step against the context's cancellation token and
/// deadline. When either fires, the step future is dropped, which also drops
/// any oracle or data-source call it was suspended on.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    max_steps: Option<usize>,
}

impl RunContext {
    /// Create a context with no deadline and a fresh token
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Set the deadline to `timeout` from now
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Set an absolute deadline
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Abort runs that execute more than `limit` steps
    pub fn with_max_steps(mut self, limit: usize) -> Self {
        self.max_steps = Some(limit);
        self
    }

    /// The cancellation token for this run
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The step limit, if any
    pub fn max_steps(&self) -> Option<usize> {
        self.max_steps
    }

    /// Time left before the deadline. `None` means no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Check for an interrupt without waiting
    pub(crate) fn interrupted(&self) -> Option<Interrupt> {
        if self.cancel.is_cancelled() {
            Some(Interrupt::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(Interrupt::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Drive `fut` unless the run is cancelled or its deadline passes first
    pub(crate) async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, Interrupt> {
        let mut cancel = self.cancel.clone();
        let deadline = self.deadline;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Interrupt::Cancelled),
            _ = sleep_until(deadline) => Err(Interrupt::DeadlineExceeded),
            output = fut => Ok(output),
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
