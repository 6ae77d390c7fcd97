//! The immutable machine document and its cold validation.
//!
//! A definition is constructed once (by hand, through the builder, or from
//! a declarative JSON document) and shared read-only across interpreter
//! instances. Structural problems are caught when an interpreter is
//! constructed, never at runtime, and validation reports every violation it
//! finds rather than stopping at the first.

use crate::core::context::Context;
use crate::core::state::{ActionDef, StateId, StateKind, StateNode, TransitionDef};
use crate::registry::HandlerRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// A complete statechart document: the state tree, the machine-level
/// transition table, the initial state, and the initial context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineDefinition {
    pub id: String,
    pub initial: StateId,
    #[serde(default)]
    pub context: Context,
    pub states: Vec<StateNode>,
    /// Machine-level table, consulted only when no active state's ancestor
    /// chain has a table entry for the event.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub on: BTreeMap<String, Vec<TransitionDef>>,
}

impl MachineDefinition {
    /// Look up a node by its full path.
    pub fn node(&self, id: &StateId) -> Option<&StateNode> {
        let mut segments = id.segments();
        let first = segments.next()?;
        let mut node = self.states.iter().find(|s| s.name == first)?;
        for segment in segments {
            node = node.child(segment)?;
        }
        Some(node)
    }

    pub fn contains(&self, id: &StateId) -> bool {
        self.node(id).is_some()
    }

    /// All nodes paired with their full ids, in document order.
    pub fn nodes(&self) -> Vec<(StateId, &StateNode)> {
        fn walk<'a>(
            prefix: Option<&StateId>,
            states: &'a [StateNode],
            out: &mut Vec<(StateId, &'a StateNode)>,
        ) {
            for node in states {
                let id = match prefix {
                    Some(p) => p.child(&node.name),
                    None => StateId::new(node.name.clone()),
                };
                out.push((id.clone(), node));
                walk(Some(&id), &node.children, out);
            }
        }

        let mut out = Vec::new();
        walk(None, &self.states, &mut out);
        out
    }

    /// Resolve an authored transition target against a source state.
    ///
    /// Absolute paths win; otherwise the target is read relative to the
    /// source's parent, which is how sibling names are written in the
    /// document. `source` is `None` for the machine-level table, where only
    /// absolute paths make sense.
    pub fn resolve_target(&self, source: Option<&StateId>, raw: &str) -> Option<StateId> {
        let absolute = StateId::new(raw);
        if self.contains(&absolute) {
            return Some(absolute);
        }
        let parent = source?.parent()?;
        let mut relative = parent;
        for segment in raw.split('.') {
            relative = relative.child(segment);
        }
        if self.contains(&relative) {
            Some(relative)
        } else {
            None
        }
    }

    /// Cold validation: structure, target resolution, and handler
    /// references, with every violation accumulated into one error.
    pub fn validate(&self, registry: &HandlerRegistry) -> Result<(), DefinitionError> {
        let mut violations = Vec::new();
        let nodes = self.nodes();

        let mut seen = BTreeSet::new();
        for (id, _) in &nodes {
            if !seen.insert(id.clone()) {
                violations.push(DefinitionViolation::DuplicateState(id.clone()));
            }
        }

        for (id, node) in &nodes {
            self.check_structure(id, node, &mut violations);
            for action in &node.entry {
                self.check_action(id.as_str(), action, true, registry, &mut violations);
            }
            for action in &node.exit {
                self.check_action(id.as_str(), action, false, registry, &mut violations);
            }
            for (event, rows) in &node.on {
                for row in rows {
                    self.check_transition(
                        Some(id),
                        id.as_str(),
                        event,
                        row,
                        registry,
                        &mut violations,
                    );
                }
            }
        }

        for (event, rows) in &self.on {
            for row in rows {
                self.check_transition(None, "(machine)", event, row, registry, &mut violations);
            }
        }

        match self.node(&self.initial) {
            None => violations.push(DefinitionViolation::UnknownMachineInitial(
                self.initial.clone(),
            )),
            Some(node) if node.kind == StateKind::History => {
                violations.push(DefinitionViolation::HistoryInitial {
                    state: self.id.clone(),
                    initial: self.initial.to_string(),
                });
            }
            Some(_) => {}
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(DefinitionError {
                machine: self.id.clone(),
                violations,
            })
        }
    }

    fn check_structure(
        &self,
        id: &StateId,
        node: &StateNode,
        violations: &mut Vec<DefinitionViolation>,
    ) {
        match node.kind {
            StateKind::Atomic => {
                if !node.children.is_empty() {
                    violations.push(DefinitionViolation::ChildrenOnAtomic(id.clone()));
                }
            }
            StateKind::Compound => {
                if node.children.is_empty() {
                    violations.push(DefinitionViolation::EmptyCompound(id.clone()));
                }
                match &node.initial {
                    None => violations.push(DefinitionViolation::MissingInitial(id.clone())),
                    Some(initial) => match node.child(initial) {
                        None => violations.push(DefinitionViolation::UnknownInitial {
                            state: id.clone(),
                            initial: initial.clone(),
                        }),
                        Some(child) if child.kind == StateKind::History => {
                            violations.push(DefinitionViolation::HistoryInitial {
                                state: id.to_string(),
                                initial: initial.clone(),
                            });
                        }
                        Some(_) => {}
                    },
                }
            }
            StateKind::Parallel => {
                if node.children.is_empty() {
                    violations.push(DefinitionViolation::EmptyParallel(id.clone()));
                }
                for child in &node.children {
                    if child.kind == StateKind::History {
                        violations
                            .push(DefinitionViolation::HistoryRegion(id.child(&child.name)));
                    }
                }
            }
            StateKind::History => {
                if !node.children.is_empty() {
                    violations.push(DefinitionViolation::HistoryWithChildren(id.clone()));
                }
                if id.parent().is_none() {
                    violations.push(DefinitionViolation::TopLevelHistory(id.clone()));
                }
            }
        }
    }

    fn check_transition(
        &self,
        source: Option<&StateId>,
        source_label: &str,
        event: &str,
        row: &TransitionDef,
        registry: &HandlerRegistry,
        violations: &mut Vec<DefinitionViolation>,
    ) {
        if let Some(raw) = &row.target {
            if self.resolve_target(source, raw).is_none() {
                violations.push(DefinitionViolation::UnresolvedTarget {
                    src: source_label.to_string(),
                    event: event.to_string(),
                    target: raw.clone(),
                });
            }
        }
        if let Some(guard) = &row.guard {
            if !registry.has_guard(guard) {
                violations.push(DefinitionViolation::UnknownGuard {
                    src: source_label.to_string(),
                    guard: guard.clone(),
                });
            }
        }
        for action in &row.actions {
            self.check_action(source_label, action, false, registry, violations);
        }
    }

    fn check_action(
        &self,
        source_label: &str,
        action: &ActionDef,
        in_entry: bool,
        registry: &HandlerRegistry,
        violations: &mut Vec<DefinitionViolation>,
    ) {
        match action {
            ActionDef::Assign(name) => {
                if !registry.has_action(name) {
                    violations.push(DefinitionViolation::UnknownAction {
                        src: source_label.to_string(),
                        action: name.clone(),
                    });
                }
            }
            ActionDef::Spawn(name) => {
                if !in_entry {
                    violations.push(DefinitionViolation::SpawnOutsideEntry {
                        src: source_label.to_string(),
                    });
                }
                if !registry.has_spawner(name) {
                    violations.push(DefinitionViolation::UnknownSpawner {
                        src: source_label.to_string(),
                        spawner: name.clone(),
                    });
                }
            }
            ActionDef::Forward(owner) => {
                if !self.contains(owner) {
                    violations.push(DefinitionViolation::UnknownForwardOwner {
                        src: source_label.to_string(),
                        owner: owner.clone(),
                    });
                }
            }
        }
    }
}

/// A single problem found while validating a definition.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DefinitionViolation {
    #[error("duplicate state id '{0}'")]
    DuplicateState(StateId),

    #[error("state '{src}' handles '{event}' with unresolvable target '{target}'")]
    UnresolvedTarget {
        src: String,
        event: String,
        target: String,
    },

    #[error("compound state '{0}' is missing an initial child")]
    MissingInitial(StateId),

    #[error("state '{state}' declares unknown initial child '{initial}'")]
    UnknownInitial { state: StateId, initial: String },

    #[error("initial '{initial}' of '{state}' must not be a history state")]
    HistoryInitial { state: String, initial: String },

    #[error("atomic state '{0}' must not have children")]
    ChildrenOnAtomic(StateId),

    #[error("compound state '{0}' has no children")]
    EmptyCompound(StateId),

    #[error("parallel state '{0}' has no regions")]
    EmptyParallel(StateId),

    #[error("history state '{0}' cannot be a region of a parallel state")]
    HistoryRegion(StateId),

    #[error("history state '{0}' must not have children")]
    HistoryWithChildren(StateId),

    #[error("history state '{0}' must be nested inside a compound state")]
    TopLevelHistory(StateId),

    #[error("unknown guard '{guard}' referenced by '{src}'")]
    UnknownGuard { src: String, guard: String },

    #[error("unknown action '{action}' referenced by '{src}'")]
    UnknownAction { src: String, action: String },

    #[error("unknown spawner '{spawner}' referenced by '{src}'")]
    UnknownSpawner { src: String, spawner: String },

    #[error("'{src}' uses spawn outside an entry action list")]
    SpawnOutsideEntry { src: String },

    #[error("forward target '{owner}' referenced by '{src}' does not exist")]
    UnknownForwardOwner { src: String, owner: StateId },

    #[error("machine initial '{0}' does not resolve to a state")]
    UnknownMachineInitial(StateId),
}

/// Fatal construction-time error carrying every violation found.
#[derive(Debug, Error)]
#[error("invalid machine definition '{machine}': {} violation(s) found", .violations.len())]
pub struct DefinitionError {
    machine: String,
    violations: Vec<DefinitionViolation>,
}

impl DefinitionError {
    pub fn machine(&self) -> &str {
        &self.machine
    }

    pub fn violations(&self) -> &[DefinitionViolation] {
        &self.violations
    }
}
