//! Graph construction

use super::edge::{ConditionalEdge, Edge, Label, Target};
use super::error::GraphError;
use super::runner::Graph;
use super::state::WorkflowState;
use super::step::Step;
use std::collections::HashMap;

/// Builder for a [`Graph`].
///
/// Registration problems are collected and reported by [`GraphBuilder::compile`],
/// so the builder can be used as a single expression. Compilation checks that
/// every name refers to a registered step and that every step has exactly one
/// outgoing edge. It does not reject cycles: a cyclic edge table runs until
/// the run's deadline or step limit stops it.
pub struct GraphBuilder<S: WorkflowState> {
    name: String,
    steps: HashMap<String, Box<dyn Step<S>>>,
    order: Vec<String>,
    edges: HashMap<String, Edge<S>>,
    entry: Option<String>,
    errors: Vec<GraphError>,
}

impl<S: WorkflowState> GraphBuilder<S> {
    /// Start building a graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: HashMap::new(),
            order: Vec::new(),
            edges: HashMap::new(),
            entry: None,
            errors: Vec::new(),
        }
    }

    /// Register a step under `name`
    pub fn add_step(mut self, name: impl Into<String>, step: impl Step<S> + 'static) -> Self {
        let name = name.into();
        if self.steps.contains_key(&name) {
            self.errors.push(GraphError::DuplicateStep {
                graph: self.name.clone(),
                step: name,
            });
            return self;
        }
        self.order.push(name.clone());
        self.steps.insert(name, Box::new(step));
        self
    }

    /// Always continue from `from` to `to` (which may be [`super::END`])
    pub fn add_edge(self, from: impl Into<String>, to: &str) -> Self {
        self.insert_edge(from.into(), Edge::Always(Target::named(to)))
    }

    /// Continue from `from` to the step the dispatched label maps to.
    ///
    /// `fallback` must appear in `table`; its successor is taken whenever the
    /// dispatched label has no entry of its own.
    pub fn add_conditional_edge<'t, L, D, I>(
        self,
        from: impl Into<String>,
        dispatch: D,
        table: I,
        fallback: L,
    ) -> Self
    where
        L: Label,
        D: Fn(&S) -> L + Send + Sync + 'static,
        I: IntoIterator<Item = (L, &'t str)>,
    {
        let from = from.into();
        let table: HashMap<L, Target> = table
            .into_iter()
            .map(|(label, to)| (label, Target::named(to)))
            .collect();

        match ConditionalEdge::new(dispatch, table, fallback) {
            Some(edge) => self.insert_edge(from, Edge::Conditional(edge)),
            None => {
                let mut this = self;
                this.errors.push(GraphError::MissingFallback {
                    graph: this.name.clone(),
                    step: from,
                    label: fallback.as_str(),
                });
                this
            }
        }
    }

    /// Designate the first step of every run
    pub fn set_entry(mut self, name: impl Into<String>) -> Self {
        self.entry = Some(name.into());
        self
    }

    fn insert_edge(mut self, from: String, edge: Edge<S>) -> Self {
        if self.edges.contains_key(&from) {
            self.errors.push(GraphError::DuplicateEdge {
                graph: self.name.clone(),
                step: from,
            });
            return self;
        }
        self.edges.insert(from, edge);
        self
    }

    /// Validate the registrations and freeze them into a [`Graph`]
    pub fn compile(mut self) -> Result<Graph<S>, GraphError> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }

        let entry = self.entry.take().ok_or_else(|| GraphError::MissingEntry {
            graph: self.name.clone(),
        })?;
        self.ensure_registered(&entry)?;

        for (from, edge) in &self.edges {
            self.ensure_registered(from)?;
            for target in edge.targets() {
                if let Some(to) = target.step_name() {
                    self.ensure_registered(to)?;
                }
            }
        }

        for name in &self.order {
            if !self.edges.contains_key(name) {
                return Err(GraphError::MissingEdge {
                    graph: self.name.clone(),
                    step: name.clone(),
                });
            }
        }

        tracing::debug!(
            graph = %self.name,
            steps = self.steps.len(),
            entry = %entry,
            "Compiled workflow graph"
        );

        Ok(Graph::from_parts(
            self.name,
            self.steps,
            self.order,
            self.edges,
            entry,
        ))
    }

    fn ensure_registered(&self, step: &str) -> Result<(), GraphError> {
        if self.steps.contains_key(step) {
            Ok(())
        } else {
            Err(GraphError::UnknownStep {
                graph: self.name.clone(),
                step: step.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{END, StepError, assign, step_fn};

    #[derive(Debug, Default)]
    struct Note {
        text: Option<String>,
    }

    impl WorkflowState for Note {
        type Update = Option<String>;

        fn merge(&mut self, update: Option<String>) {
            assign(&mut self.text, update);
        }
    }

    fn write(_: &Note) -> Result<Option<String>, StepError> {
        Ok(Some("written".into()))
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Switch {
        On,
        Off,
    }

    impl Label for Switch {
        const ALL: &'static [Self] = &[Switch::On, Switch::Off];

        fn as_str(&self) -> &'static str {
            match self {
                Switch::On => "on",
                Switch::Off => "off",
            }
        }
    }

    #[test]
    fn test_compile_linear_graph() {
        let graph = GraphBuilder::new("linear")
            .add_step("a", step_fn(write))
            .add_step("b", step_fn(write))
            .set_entry("a")
            .add_edge("a", "b")
            .add_edge("b", END)
            .compile()
            .unwrap();

        assert_eq!(graph.name(), "linear");
        assert_eq!(graph.entry(), "a");
        assert_eq!(graph.step_names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_missing_entry() {
        let result = GraphBuilder::new("g")
            .add_step("a", step_fn(write))
            .add_edge("a", END)
            .compile();
        assert!(matches!(result, Err(GraphError::MissingEntry { .. })));
    }

    #[test]
    fn test_unknown_edge_target() {
        let result = GraphBuilder::new("g")
            .add_step("a", step_fn(write))
            .set_entry("a")
            .add_edge("a", "nowhere")
            .compile();
        assert!(matches!(result, Err(GraphError::UnknownStep { step, .. }) if step == "nowhere"));
    }

    #[test]
    fn test_duplicate_step_and_edge() {
        let result = GraphBuilder::new("g")
            .add_step("a", step_fn(write))
            .add_step("a", step_fn(write))
            .compile();
        assert!(matches!(result, Err(GraphError::DuplicateStep { .. })));

        let result = GraphBuilder::new("g")
            .add_step("a", step_fn(write))
            .set_entry("a")
            .add_edge("a", END)
            .add_edge("a", END)
            .compile();
        assert!(matches!(result, Err(GraphError::DuplicateEdge { .. })));
    }

    #[test]
    fn test_step_without_edge() {
        let result = GraphBuilder::new("g")
            .add_step("a", step_fn(write))
            .add_step("b", step_fn(write))
            .set_entry("a")
            .add_edge("a", END)
            .compile();
        assert!(matches!(result, Err(GraphError::MissingEdge { step, .. }) if step == "b"));
    }

    #[test]
    fn test_conditional_edge_needs_fallback() {
        let result = GraphBuilder::new("g")
            .add_step("a", step_fn(write))
            .set_entry("a")
            .add_conditional_edge("a", |_: &Note| Switch::On, [(Switch::On, END)], Switch::Off)
            .compile();
        assert!(matches!(
            result,
            Err(GraphError::MissingFallback { label: "off", .. })
        ));
    }

    #[test]
    fn test_cycles_are_accepted() {
        let result = GraphBuilder::new("loop")
            .add_step("a", step_fn(write))
            .add_step("b", step_fn(write))
            .set_entry("a")
            .add_edge("a", "b")
            .add_edge("b", "a")
            .compile();
        assert!(result.is_ok());
    }
}
