//! Builder for state tree nodes.

use crate::builder::error::BuildError;
use crate::builder::transition::TransitionBuilder;
use crate::core::{ActionDef, StateId, StateKind, StateNode};
use std::collections::BTreeMap;

/// Fluent builder for a node of the state tree.
///
/// A node with children becomes compound unless marked parallel; a node
/// without children stays atomic. History pseudostates come from
/// [`StateBuilder::history`].
///
/// # Example
///
/// ```rust
/// use strata::builder::{StateBuilder, TransitionBuilder};
///
/// let node = StateBuilder::new("startMachine")
///     .initial("preStart")
///     .on("SHOW_SETTINGS", TransitionBuilder::to("settings"))
///     .state(StateBuilder::new("preStart").entry_assign("isAtPreStart"))
///     .state(StateBuilder::history("hist"));
/// ```
#[derive(Debug, Default)]
pub struct StateBuilder {
    name: String,
    kind: Option<StateKind>,
    initial: Option<String>,
    children: Vec<StateBuilder>,
    entry: Vec<ActionDef>,
    exit: Vec<ActionDef>,
    on: Vec<(String, TransitionBuilder)>,
}

impl StateBuilder {
    /// Start a node. The kind is inferred at build time from its children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Start a history pseudostate.
    pub fn history(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some(StateKind::History),
            ..Self::default()
        }
    }

    /// Mark the node parallel: every child is a concurrently active region.
    pub fn parallel(mut self) -> Self {
        self.kind = Some(StateKind::Parallel);
        self
    }

    /// Name the default child entered when this node is targeted directly.
    pub fn initial(mut self, name: impl Into<String>) -> Self {
        self.initial = Some(name.into());
        self
    }

    /// Add a child node.
    pub fn state(mut self, child: StateBuilder) -> Self {
        self.children.push(child);
        self
    }

    /// Append an arbitrary entry action.
    pub fn entry(mut self, action: ActionDef) -> Self {
        self.entry.push(action);
        self
    }

    /// Append a registered assign action to the entry list.
    pub fn entry_assign(self, name: impl Into<String>) -> Self {
        self.entry(ActionDef::Assign(name.into()))
    }

    /// Append a spawner to the entry list; the spawned actor is owned by
    /// this node.
    pub fn entry_spawn(self, name: impl Into<String>) -> Self {
        self.entry(ActionDef::Spawn(name.into()))
    }

    /// Append a registered assign action to the exit list.
    pub fn exit_assign(mut self, name: impl Into<String>) -> Self {
        self.exit.push(ActionDef::Assign(name.into()));
        self
    }

    /// Append a forward action to the entry list.
    pub fn entry_forward(self, owner: impl Into<StateId>) -> Self {
        self.entry(ActionDef::Forward(owner.into()))
    }

    /// Add a transition table row for an event type. Repeated calls for
    /// the same event append rows in priority order.
    pub fn on(mut self, event: impl Into<String>, transition: TransitionBuilder) -> Self {
        self.on.push((event.into(), transition));
        self
    }

    pub(crate) fn build(self) -> Result<StateNode, BuildError> {
        let kind = match self.kind {
            Some(kind) => kind,
            None if self.children.is_empty() => StateKind::Atomic,
            None => StateKind::Compound,
        };

        if kind == StateKind::History && !self.children.is_empty() {
            return Err(BuildError::HistoryWithChildren { state: self.name });
        }
        if self.initial.is_some() && self.children.is_empty() {
            return Err(BuildError::InitialWithoutChildren { state: self.name });
        }

        let mut on: BTreeMap<String, Vec<_>> = BTreeMap::new();
        for (event, row) in self.on {
            let built = row.build(&self.name, &event)?;
            on.entry(event).or_default().push(built);
        }

        let mut children = Vec::with_capacity(self.children.len());
        for child in self.children {
            children.push(child.build()?);
        }

        Ok(StateNode {
            name: self.name,
            kind,
            initial: self.initial,
            children,
            entry: self.entry,
            exit: self.exit,
            on,
        })
    }
}
