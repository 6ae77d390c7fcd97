//! The static state tree: ids, node kinds, and transition tables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Path of atomic names from the machine root to a node, joined with `.`
/// (for example `startMachine.choosingWallet`).
///
/// Ids are unique within a machine definition; every transition target must
/// resolve to an existing id when the interpreter is constructed.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(String);

impl StateId {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments from root to leaf.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Number of segments in the path.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// The name of the deepest segment.
    pub fn leaf_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// The containing node's id, or `None` for a top-level state.
    pub fn parent(&self) -> Option<StateId> {
        self.0.rfind('.').map(|idx| StateId(self.0[..idx].to_string()))
    }

    /// Extend the path by one child name.
    pub fn child(&self, name: &str) -> StateId {
        StateId(format!("{}.{}", self.0, name))
    }

    /// Proper-ancestor test: true when `other` lies strictly below `self`.
    pub fn is_ancestor_of(&self, other: &StateId) -> bool {
        other.0.len() > self.0.len()
            && other.0.starts_with(&self.0)
            && other.0.as_bytes()[self.0.len()] == b'.'
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StateId {
    fn from(path: &str) -> Self {
        StateId::new(path)
    }
}

impl From<String> for StateId {
    fn from(path: String) -> Self {
        StateId::new(path)
    }
}

/// How a node behaves within the tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    /// Leaf node, no children.
    #[default]
    Atomic,
    /// Has children, exactly one active at a time, one marked initial.
    Compound,
    /// Has children that are all active concurrently.
    Parallel,
    /// Pseudostate that resolves to the last active child of its parent.
    History,
}

/// An action referenced from a transition or an entry/exit list, resolved
/// against the handler registry by symbolic name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionDef {
    /// Run a registered assign handler and fold its patch into the step.
    Assign(String),
    /// Run a registered spawner and attach the child machine to the state
    /// being entered. Only legal in entry action lists.
    Spawn(String),
    /// Relay the current event to the actor owned by the named state.
    /// A no-op when that actor is absent or stopped.
    Forward(StateId),
}

/// One row of a transition table: optional guard, optional target, and the
/// actions to run if the row is taken. Rows for the same event type are
/// evaluated in order and the first row whose guard passes wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    /// Target state path, absolute or relative to the source's parent.
    /// `None` makes the transition internal: actions run, nothing is
    /// exited or entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionDef>,
}

/// A node in the state tree.
///
/// Children are ordered; insertion order is document order and decides
/// priority wherever the interpreter iterates regions or resolves defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateNode {
    /// Local name, a single path segment.
    pub name: String,
    #[serde(default)]
    pub kind: StateKind,
    /// Local name of the default child. Required for compound nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<StateNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<ActionDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exit: Vec<ActionDef>,
    /// Transition table: event type to ordered candidate rows.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub on: BTreeMap<String, Vec<TransitionDef>>,
}

impl StateNode {
    pub fn child(&self, name: &str) -> Option<&StateNode> {
        self.children.iter().find(|c| c.name == name)
    }
}
