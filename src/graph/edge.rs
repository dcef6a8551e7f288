//! Edges between steps

use super::END;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// A closed set of routing labels produced by a classification.
///
/// Conditional edges dispatch on a `Label` instead of raw strings, so a label
/// that the edge table does not know about can only arise from a missing
/// table entry, which the fallback arm covers.
pub trait Label: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Every member of the label set, in declaration order
    const ALL: &'static [Self];

    /// Canonical lower-case name
    fn as_str(&self) -> &'static str;

    /// Look up a label by its canonical name
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|label| label.as_str() == name)
    }
}

/// Where an edge leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Step(String),
    End,
}

impl Target {
    /// Resolve a step name, treating [`END`] as the terminal marker
    pub fn named(name: &str) -> Self {
        if name == END {
            Target::End
        } else {
            Target::Step(name.to_string())
        }
    }

    pub fn step_name(&self) -> Option<&str> {
        match self {
            Target::Step(name) => Some(name),
            Target::End => None,
        }
    }
}

type Resolver<S> = Box<dyn Fn(&S) -> (&'static str, Target) + Send + Sync>;

/// Outgoing edge of one step
pub(crate) enum Edge<S> {
    Always(Target),
    Conditional(ConditionalEdge<S>),
}

impl<S> Edge<S> {
    /// Every step this edge can lead to
    pub(crate) fn targets(&self) -> Vec<&Target> {
        match self {
            Edge::Always(target) => vec![target],
            Edge::Conditional(edge) => edge.targets.iter().collect(),
        }
    }
}

/// Label-dispatched edge with its lookup table erased behind a resolver
pub(crate) struct ConditionalEdge<S> {
    resolve: Resolver<S>,
    targets: Vec<Target>,
}

impl<S: 'static> ConditionalEdge<S> {
    /// Build the edge. Returns `None` when `fallback` has no entry in `table`.
    pub(crate) fn new<L, D>(dispatch: D, table: HashMap<L, Target>, fallback: L) -> Option<Self>
    where
        L: Label,
        D: Fn(&S) -> L + Send + Sync + 'static,
    {
        let fallback_target = table.get(&fallback)?.clone();
        let mut targets: Vec<Target> = table.values().cloned().collect();
        targets.sort_by(|a, b| a.step_name().cmp(&b.step_name()));
        targets.dedup();

        let resolve = move |state: &S| {
            let label = dispatch(state);
            match table.get(&label) {
                Some(target) => (label.as_str(), target.clone()),
                None => (fallback.as_str(), fallback_target.clone()),
            }
        };

        Some(Self {
            resolve: Box::new(resolve),
            targets,
        })
    }

    /// Evaluate the dispatch function and pick the successor
    pub(crate) fn resolve(&self, state: &S) -> (&'static str, Target) {
        (self.resolve)(state)
    }
}
