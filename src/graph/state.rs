//! Run state contract

/// State threaded through one workflow run.
///
/// Each workflow declares a state struct and a matching update struct whose
/// fields are all optional. [`WorkflowState::merge`] applies an update with
/// last-writer-wins semantics: every field present in the update replaces the
/// state's value, absent fields are left untouched. Nested values are
/// replaced whole, never merged.
pub trait WorkflowState: Send + Sync + 'static {
    /// Partial update returned by a step
    type Update: Send + 'static;

    /// Apply a step's update to this state
    fn merge(&mut self, update: Self::Update);
}

/// Overwrite `field` when the update carries a value.
pub fn assign<T>(field: &mut Option<T>, update: Option<T>) {
    if let Some(value) = update {
        *field = Some(value);
    }
}
