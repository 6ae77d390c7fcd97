//! Builder for complete machine documents.

use crate::builder::error::BuildError;
use crate::builder::state::StateBuilder;
use crate::builder::transition::TransitionBuilder;
use crate::core::{Context, MachineDefinition, StateId};
use serde_json::Value;
use std::collections::BTreeMap;

/// Fluent builder for a [`MachineDefinition`].
///
/// # Example
///
/// ```rust
/// use strata::builder::{MachineBuilder, StateBuilder, TransitionBuilder};
/// use serde_json::json;
///
/// let definition = MachineBuilder::new("traffic")
///     .initial("red")
///     .context_field("cars", json!(0))
///     .state(StateBuilder::new("red").on("TIMER", TransitionBuilder::to("green")))
///     .state(StateBuilder::new("green").on("TIMER", TransitionBuilder::to("red")))
///     .build()
///     .unwrap();
///
/// assert_eq!(definition.states.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MachineBuilder {
    id: String,
    initial: Option<String>,
    context: Context,
    states: Vec<StateBuilder>,
    on: Vec<(String, TransitionBuilder)>,
}

impl MachineBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set the initial state (required). Accepts a nested path.
    pub fn initial(mut self, state: impl Into<String>) -> Self {
        self.initial = Some(state.into());
        self
    }

    /// Replace the initial context wholesale.
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Set one field of the initial context.
    pub fn context_field(mut self, field: impl Into<String>, value: Value) -> Self {
        self.context = self.context.with(field, value);
        self
    }

    /// Add a top-level state.
    pub fn state(mut self, state: StateBuilder) -> Self {
        self.states.push(state);
        self
    }

    /// Add a machine-level transition row, consulted only when no active
    /// state's ancestor chain handles the event.
    pub fn on(mut self, event: impl Into<String>, transition: TransitionBuilder) -> Self {
        self.on.push((event.into(), transition));
        self
    }

    /// Build the document. Deep structural validation happens later, when
    /// an interpreter is constructed over it.
    pub fn build(self) -> Result<MachineDefinition, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        if self.states.is_empty() {
            return Err(BuildError::NoStates);
        }

        let mut states = Vec::with_capacity(self.states.len());
        for state in self.states {
            states.push(state.build()?);
        }

        let mut on: BTreeMap<String, Vec<_>> = BTreeMap::new();
        for (event, row) in self.on {
            let built = row.build("(machine)", &event)?;
            on.entry(event).or_default().push(built);
        }

        Ok(MachineDefinition {
            id: self.id,
            initial: StateId::new(initial),
            context: self.context,
            states,
            on,
        })
    }
}
