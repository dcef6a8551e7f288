//! Compiled graph and the run loop

use super::context::{Interrupt, RunContext};
use super::edge::{Edge, Target};
use super::error::GraphError;
use super::state::WorkflowState;
use super::step::Step;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Record of one executed step
#[derive(Debug, Clone)]
pub struct StepRecord {
    /// Step name
    pub step: String,

    /// Wall time spent in the step
    pub elapsed: Duration,

    /// Label chosen by the step's conditional edge, if it has one
    pub label: Option<&'static str>,
}

/// Result of a completed run
#[derive(Debug)]
pub struct RunOutcome<S> {
    /// Final state after the last merge
    pub state: S,

    /// Executed steps in order
    pub trace: Vec<StepRecord>,

    /// Total execution time
    pub elapsed: Duration,
}

/// Immutable, compiled workflow graph.
///
/// Holds no per-run data, so one instance behind an `Arc` serves any number
/// of concurrent runs.
pub struct Graph<S: WorkflowState> {
    name: String,
    steps: HashMap<String, Box<dyn Step<S>>>,
    order: Vec<String>,
    edges: HashMap<String, Edge<S>>,
    entry: String,
}

impl<S: WorkflowState> Graph<S> {
    pub(crate) fn from_parts(
        name: String,
        steps: HashMap<String, Box<dyn Step<S>>>,
        order: Vec<String>,
        edges: HashMap<String, Edge<S>>,
        entry: String,
    ) -> Self {
        Self {
            name,
            steps,
            order,
            edges,
            entry,
        }
    }

    /// Graph name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entry step name
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Step names in registration order
    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Walk the graph from the entry step until an edge leads to `END`.
    ///
    /// Steps run strictly one after another. A step error, cancellation or an
    /// expired deadline aborts the run; updates merged before that point are
    /// discarded with the state.
    pub async fn run(&self, initial: S, ctx: &RunContext) -> Result<RunOutcome<S>, GraphError> {
        let start = Instant::now();
        let mut state = initial;
        let mut trace = Vec::new();
        let mut current = self.entry.clone();

        info!(graph = %self.name, entry = %current, "Starting workflow run");

        loop {
            if let Some(limit) = ctx.max_steps() {
                if trace.len() >= limit {
                    warn!(graph = %self.name, limit, "Step limit reached, aborting run");
                    return Err(GraphError::StepLimitExceeded {
                        graph: self.name.clone(),
                        limit,
                    });
                }
            }

            let step = self
                .steps
                .get(&current)
                .ok_or_else(|| GraphError::UnknownStep {
                    graph: self.name.clone(),
                    step: current.clone(),
                })?;

            if let Some(interrupt) = ctx.interrupted() {
                return Err(self.interrupted(interrupt, &current));
            }

            debug!(graph = %self.name, step = %current, "Running step");
            let step_start = Instant::now();

            let update = match ctx.guard(step.run(&state, ctx)).await {
                Ok(Ok(update)) => update,
                Ok(Err(source)) => {
                    warn!(graph = %self.name, step = %current, error = %source, "Step failed");
                    return Err(GraphError::StepFailed {
                        graph: self.name.clone(),
                        step: current,
                        source,
                    });
                }
                Err(interrupt) => return Err(self.interrupted(interrupt, &current)),
            };
            state.merge(update);

            let (label, next) = match self.edges.get(&current) {
                Some(Edge::Always(target)) => (None, target.clone()),
                Some(Edge::Conditional(edge)) => {
                    let (label, target) = edge.resolve(&state);
                    (Some(label), target)
                }
                None => {
                    return Err(GraphError::MissingEdge {
                        graph: self.name.clone(),
                        step: current,
                    });
                }
            };

            let elapsed = step_start.elapsed();
            debug!(
                graph = %self.name,
                step = %current,
                elapsed_ms = elapsed.as_millis() as u64,
                label = label.unwrap_or("-"),
                "Step complete"
            );
            trace.push(StepRecord {
                step: current,
                elapsed,
                label,
            });

            match next {
                Target::Step(name) => current = name,
                Target::End => break,
            }
        }

        let elapsed = start.elapsed();
        info!(
            graph = %self.name,
            steps = trace.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Workflow run complete"
        );

        Ok(RunOutcome {
            state,
            trace,
            elapsed,
        })
    }

    fn interrupted(&self, interrupt: Interrupt, step: &str) -> GraphError {
        warn!(graph = %self.name, step, ?interrupt, "Workflow run interrupted");
        match interrupt {
            Interrupt::Cancelled => GraphError::Cancelled {
                graph: self.name.clone(),
                step: step.to_string(),
            },
            Interrupt::DeadlineExceeded => GraphError::DeadlineExceeded {
                graph: self.name.clone(),
                step: step.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{
        CancellationToken, END, GraphBuilder, Label, StepError, assign, step_fn,
    };
    use async_trait::async_trait;
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Mood {
        Happy,
        Sad,
        Unsure,
    }

    impl Label for Mood {
        const ALL: &'static [Self] = &[Mood::Happy, Mood::Sad, Mood::Unsure];

        fn as_str(&self) -> &'static str {
            match self {
                Mood::Happy => "happy",
                Mood::Sad => "sad",
                Mood::Unsure => "unsure",
            }
        }
    }

    #[derive(Debug, Default)]
    struct Chat {
        message: String,
        mood: Option<Mood>,
        reply: Option<String>,
        visits: Option<u32>,
    }

    #[derive(Default)]
    struct ChatUpdate {
        mood: Option<Mood>,
        reply: Option<String>,
        visits: Option<u32>,
    }

    impl WorkflowState for Chat {
        type Update = ChatUpdate;

        fn merge(&mut self, update: ChatUpdate) {
            assign(&mut self.mood, update.mood);
            assign(&mut self.reply, update.reply);
            assign(&mut self.visits, update.visits);
        }
    }

    fn classify(state: &Chat) -> Result<ChatUpdate, StepError> {
        let mood = match state.message.as_str() {
            "yay" => Mood::Happy,
            "meh" => Mood::Unsure,
            _ => Mood::Sad,
        };
        Ok(ChatUpdate {
            mood: Some(mood),
            ..Default::default()
        })
    }

    fn cheer(_: &Chat) -> Result<ChatUpdate, StepError> {
        Ok(ChatUpdate {
            reply: Some("great!".into()),
            ..Default::default()
        })
    }

    fn console(_: &Chat) -> Result<ChatUpdate, StepError> {
        Ok(ChatUpdate {
            reply: Some("sorry".into()),
            ..Default::default()
        })
    }

    fn count(state: &Chat) -> Result<ChatUpdate, StepError> {
        Ok(ChatUpdate {
            visits: Some(state.visits.unwrap_or(0) + 1),
            ..Default::default()
        })
    }

    fn routed_graph() -> Graph<Chat> {
        GraphBuilder::new("mood")
            .add_step("classify", step_fn(classify))
            .add_step("cheer", step_fn(cheer))
            .add_step("console", step_fn(console))
            .set_entry("classify")
            .add_conditional_edge(
                "classify",
                |s: &Chat| s.mood.unwrap_or(Mood::Sad),
                [(Mood::Happy, "cheer"), (Mood::Sad, "console")],
                Mood::Sad,
            )
            .add_edge("cheer", END)
            .add_edge("console", END)
            .compile()
            .unwrap()
    }

    fn chat(message: &str) -> Chat {
        Chat {
            message: message.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_conditional_routing() {
        let graph = routed_graph();
        let outcome = graph.run(chat("yay"), &RunContext::new()).await.unwrap();

        assert_eq!(outcome.state.reply.as_deref(), Some("great!"));
        assert_eq!(outcome.state.mood, Some(Mood::Happy));
        let steps: Vec<_> = outcome.trace.iter().map(|r| r.step.as_str()).collect();
        assert_eq!(steps, vec!["classify", "cheer"]);
        assert_eq!(outcome.trace[0].label, Some("happy"));
        assert_eq!(outcome.trace[1].label, None);
    }

    #[tokio::test]
    async fn test_unmapped_label_takes_fallback() {
        let graph = routed_graph();
        let outcome = graph.run(chat("meh"), &RunContext::new()).await.unwrap();

        assert_eq!(outcome.state.mood, Some(Mood::Unsure));
        assert_eq!(outcome.state.reply.as_deref(), Some("sorry"));
        assert_eq!(outcome.trace[0].label, Some("sad"));
    }

    #[tokio::test]
    async fn test_shared_graph_concurrent_runs() {
        let graph = Arc::new(routed_graph());

        let handles: Vec<_> = ["yay", "boo", "yay", "meh"]
            .into_iter()
            .map(|msg| {
                let graph = graph.clone();
                tokio::spawn(async move { graph.run(chat(msg), &RunContext::new()).await })
            })
            .collect();

        let mut replies = Vec::new();
        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            replies.push(outcome.state.reply.unwrap());
        }
        assert_eq!(replies, vec!["great!", "sorry", "great!", "sorry"]);
    }

    struct Failing;

    #[async_trait]
    impl Step<Chat> for Failing {
        async fn run(&self, _: &Chat, _: &RunContext) -> Result<ChatUpdate, StepError> {
            Err(StepError::failed("exploded"))
        }
    }

    #[tokio::test]
    async fn test_step_failure_aborts_run() {
        let graph = GraphBuilder::new("failing")
            .add_step("count", step_fn(count))
            .add_step("boom", Failing)
            .add_step("after", step_fn(cheer))
            .set_entry("count")
            .add_edge("count", "boom")
            .add_edge("boom", "after")
            .add_edge("after", END)
            .compile()
            .unwrap();

        let err = graph.run(chat("x"), &RunContext::new()).await.unwrap_err();
        match err {
            GraphError::StepFailed { step, source, .. } => {
                assert_eq!(step, "boom");
                assert!(source.to_string().contains("exploded"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    struct Slow;

    #[async_trait]
    impl Step<Chat> for Slow {
        async fn run(&self, _: &Chat, _: &RunContext) -> Result<ChatUpdate, StepError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(ChatUpdate::default())
        }
    }

    fn slow_graph() -> Graph<Chat> {
        GraphBuilder::new("slow")
            .add_step("slow", Slow)
            .set_entry("slow")
            .add_edge("slow", END)
            .compile()
            .unwrap()
    }

    #[tokio::test]
    async fn test_deadline_aborts_suspended_step() {
        let graph = slow_graph();
        let ctx = RunContext::new().with_timeout(Duration::from_millis(20));

        let err = graph.run(chat("x"), &ctx).await.unwrap_err();
        assert!(matches!(err, GraphError::DeadlineExceeded { step, .. } if step == "slow"));
    }

    #[tokio::test]
    async fn test_cancellation_aborts_suspended_step() {
        let graph = slow_graph();
        let token = CancellationToken::new();
        let ctx = RunContext::new().with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let err = graph.run(chat("x"), &ctx).await.unwrap_err();
        assert!(matches!(err, GraphError::Cancelled { .. }));
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn test_step_limit_stops_cycle() {
        let graph = GraphBuilder::new("loop")
            .add_step("a", step_fn(count))
            .add_step("b", step_fn(count))
            .set_entry("a")
            .add_edge("a", "b")
            .add_edge("b", "a")
            .compile()
            .unwrap();

        let ctx = RunContext::new().with_max_steps(5);
        let err = graph.run(chat("x"), &ctx).await.unwrap_err();
        assert!(matches!(err, GraphError::StepLimitExceeded { limit: 5, .. }));
    }
}
