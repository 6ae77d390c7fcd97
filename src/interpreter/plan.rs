//! Pure configuration math for one step.
//!
//! Nothing in this module mutates interpreter state. Selection walks the
//! active leaves, the domain is the least common compound ancestor of
//! source and target, exit sets come out innermost-first, and entry plans
//! come out outermost-first with defaults and parallel regions completed.

use crate::core::{Context, Event, MachineDefinition, StateId, StateKind, TransitionDef};
use crate::interpreter::error::TransitionError;
use crate::registry::{HandlerError, HandlerRegistry};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A transition chosen for one active leaf. `source` is the node whose
/// table matched, `None` for the machine-level table.
pub(crate) struct Selection<'a> {
    pub source: Option<StateId>,
    pub transition: &'a TransitionDef,
}

/// Pick the transitions an event fires, one per active leaf at most,
/// deduplicated by source node.
///
/// For each leaf the walk stops at the nearest ancestor whose table has
/// rows for the event type. Rows there are tried in order and the first
/// row whose guard passes wins; if every guard is false the event is
/// unhandled for that leaf and does not fall through to outer ancestors.
pub(crate) fn select<'a>(
    definition: &'a MachineDefinition,
    configuration: &[StateId],
    context: &Context,
    registry: &HandlerRegistry,
    event: &Event,
) -> Result<Vec<Selection<'a>>, TransitionError> {
    let mut selections = Vec::new();
    let mut matched_sources: BTreeSet<Option<StateId>> = BTreeSet::new();

    for leaf in configuration {
        let mut matched: Option<(Option<StateId>, &Vec<TransitionDef>)> = None;
        let mut level = Some(leaf.clone());
        while let Some(id) = level {
            if let Some(node) = definition.node(&id) {
                if let Some(rows) = node.on.get(&event.event_type) {
                    matched = Some((Some(id), rows));
                    break;
                }
            }
            level = id.parent();
        }
        if matched.is_none() {
            if let Some(rows) = definition.on.get(&event.event_type) {
                matched = Some((None, rows));
            }
        }

        let Some((source, rows)) = matched else {
            continue;
        };
        if !matched_sources.insert(source.clone()) {
            continue;
        }

        for row in rows {
            if guard_passes(row, context, registry, event)? {
                selections.push(Selection {
                    source,
                    transition: row,
                });
                break;
            }
        }
    }

    Ok(selections)
}

fn guard_passes(
    row: &TransitionDef,
    context: &Context,
    registry: &HandlerRegistry,
    event: &Event,
) -> Result<bool, TransitionError> {
    let Some(name) = &row.guard else {
        return Ok(true);
    };
    let guard = registry
        .guard(name)
        .ok_or_else(|| TransitionError::GuardFailed {
            guard: name.clone(),
            event: event.event_type.clone(),
            reason: HandlerError::new("guard is not registered"),
        })?;
    guard(context, event).map_err(|reason| TransitionError::GuardFailed {
        guard: name.clone(),
        event: event.event_type.clone(),
        reason,
    })
}

/// Least common compound ancestor of source and target, `None` meaning the
/// machine root. The domain is a proper ancestor of both, so a targeted
/// self-transition exits and re-enters its source.
pub(crate) fn domain(source: Option<&StateId>, target: &StateId) -> Option<StateId> {
    let source = source?;

    let mut common: Vec<&str> = Vec::new();
    for (a, b) in source.segments().zip(target.segments()) {
        if a == b {
            common.push(a);
        } else {
            break;
        }
    }
    let mut candidate = if common.is_empty() {
        None
    } else {
        Some(StateId::new(common.join(".")))
    };
    while let Some(id) = &candidate {
        if id == source || id == target {
            candidate = id.parent();
        } else {
            break;
        }
    }
    candidate
}

/// All active nodes strictly inside the domain, innermost-first (deepest
/// first, reverse document order within a depth).
pub(crate) fn exit_set(
    configuration: &[StateId],
    domain: Option<&StateId>,
    order: &HashMap<StateId, usize>,
) -> Vec<StateId> {
    let mut set: BTreeSet<StateId> = BTreeSet::new();
    for leaf in configuration {
        let in_scope = match domain {
            None => true,
            Some(d) => d.is_ancestor_of(leaf),
        };
        if !in_scope {
            continue;
        }
        let mut current = Some(leaf.clone());
        while let Some(id) = current {
            if Some(&id) == domain {
                break;
            }
            let parent = id.parent();
            set.insert(id);
            current = parent;
        }
    }

    let mut exits: Vec<StateId> = set.into_iter().collect();
    exits.sort_by(|a, b| {
        b.depth()
            .cmp(&a.depth())
            .then_with(|| order.get(b).cmp(&order.get(a)))
    });
    exits
}

/// The immediate child of `parent` on some active leaf's path.
pub(crate) fn active_child(configuration: &[StateId], parent: &StateId) -> Option<StateId> {
    configuration.iter().find_map(|leaf| {
        if parent.is_ancestor_of(leaf) {
            leaf.segments()
                .nth(parent.depth())
                .map(|name| parent.child(name))
        } else {
            None
        }
    })
}

/// The nodes entered by a transition, outermost-first, plus the leaves the
/// machine settles into below the target.
pub(crate) struct EntryPlan {
    pub nodes: Vec<StateId>,
    pub leaves: Vec<StateId>,
    /// Target after history resolution.
    pub target: StateId,
}

/// Compute the entry set from the domain down to the target, resolving a
/// history target against the recorded last-active child (falling back to
/// the parent's default child) and completing defaults and parallel
/// regions below the target.
pub(crate) fn entry_plan(
    definition: &MachineDefinition,
    domain: Option<&StateId>,
    target: &StateId,
    history: &BTreeMap<StateId, StateId>,
) -> Result<EntryPlan, TransitionError> {
    let node = definition
        .node(target)
        .ok_or_else(|| unresolved(target))?;

    let effective = if node.kind == StateKind::History {
        let parent = target.parent().ok_or_else(|| unresolved(target))?;
        match history.get(&parent) {
            Some(recorded) => recorded.clone(),
            None => {
                let parent_node = definition.node(&parent).ok_or_else(|| unresolved(&parent))?;
                let initial = parent_node
                    .initial
                    .as_deref()
                    .ok_or_else(|| unresolved(target))?;
                parent.child(initial)
            }
        }
    } else {
        target.clone()
    };

    // Path from just below the domain down to the effective target.
    let skip = domain.map(|d| d.depth()).unwrap_or(0);
    let path: Vec<&str> = effective.segments().skip(skip).collect();
    if path.is_empty() {
        return Err(unresolved(target));
    }

    let mut nodes = Vec::new();
    let mut leaves = Vec::new();
    let first = match domain {
        Some(d) => d.child(path[0]),
        None => StateId::new(path[0]),
    };
    descend(definition, first, &path[1..], &mut nodes, &mut leaves)?;

    Ok(EntryPlan {
        nodes,
        leaves,
        target: effective,
    })
}

fn descend(
    definition: &MachineDefinition,
    id: StateId,
    remaining: &[&str],
    nodes: &mut Vec<StateId>,
    leaves: &mut Vec<StateId>,
) -> Result<(), TransitionError> {
    nodes.push(id.clone());
    let node = definition.node(&id).ok_or_else(|| unresolved(&id))?;

    if let Some(next_name) = remaining.first() {
        match node.kind {
            StateKind::Parallel => {
                for child in &node.children {
                    let child_id = id.child(&child.name);
                    if child.name == *next_name {
                        descend(definition, child_id, &remaining[1..], nodes, leaves)?;
                    } else {
                        complete(definition, child_id, nodes, leaves)?;
                    }
                }
            }
            _ => {
                descend(definition, id.child(next_name), &remaining[1..], nodes, leaves)?;
            }
        }
        return Ok(());
    }

    complete_below(definition, &id, node.kind, nodes, leaves)
}

fn complete(
    definition: &MachineDefinition,
    id: StateId,
    nodes: &mut Vec<StateId>,
    leaves: &mut Vec<StateId>,
) -> Result<(), TransitionError> {
    nodes.push(id.clone());
    let node = definition.node(&id).ok_or_else(|| unresolved(&id))?;
    complete_below(definition, &id, node.kind, nodes, leaves)
}

fn complete_below(
    definition: &MachineDefinition,
    id: &StateId,
    kind: StateKind,
    nodes: &mut Vec<StateId>,
    leaves: &mut Vec<StateId>,
) -> Result<(), TransitionError> {
    match kind {
        StateKind::Atomic => {
            leaves.push(id.clone());
            Ok(())
        }
        StateKind::Compound => {
            let node = definition.node(id).ok_or_else(|| unresolved(id))?;
            let initial = node.initial.as_deref().ok_or_else(|| unresolved(id))?;
            complete(definition, id.child(initial), nodes, leaves)
        }
        StateKind::Parallel => {
            let node = definition.node(id).ok_or_else(|| unresolved(id))?;
            for child in &node.children {
                complete(definition, id.child(&child.name), nodes, leaves)?;
            }
            Ok(())
        }
        // Validation keeps history out of default chains and regions.
        StateKind::History => Err(unresolved(id)),
    }
}

/// New active configuration: leaves outside the domain survive, leaves
/// inside are replaced by the entered ones, document order restored.
pub(crate) fn update_config(
    configuration: &[StateId],
    domain: Option<&StateId>,
    entered_leaves: &[StateId],
    order: &HashMap<StateId, usize>,
) -> Vec<StateId> {
    let mut next: Vec<StateId> = configuration
        .iter()
        .filter(|leaf| match domain {
            None => false,
            Some(d) => !d.is_ancestor_of(leaf),
        })
        .cloned()
        .collect();
    next.extend(entered_leaves.iter().cloned());
    next.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
    next.dedup();
    next
}

fn unresolved(id: &StateId) -> TransitionError {
    TransitionError::UnresolvedTarget {
        target: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{MachineBuilder, StateBuilder, TransitionBuilder};

    fn order_of(definition: &MachineDefinition) -> HashMap<StateId, usize> {
        definition
            .nodes()
            .into_iter()
            .enumerate()
            .map(|(idx, (id, _))| (id, idx))
            .collect()
    }

    fn overlay_machine() -> MachineDefinition {
        MachineBuilder::new("overlay")
            .initial("main")
            .state(
                StateBuilder::new("main")
                    .initial("first")
                    .on("SHOW_OVERLAY", TransitionBuilder::to("overlay"))
                    .state(StateBuilder::new("first").on("NEXT", TransitionBuilder::to("second")))
                    .state(StateBuilder::new("second"))
                    .state(StateBuilder::history("hist")),
            )
            .state(
                StateBuilder::new("overlay")
                    .initial("overlay")
                    .on("BACK", TransitionBuilder::to("main.hist"))
                    .state(StateBuilder::new("overlay")),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn domain_of_siblings_is_their_parent() {
        let source = StateId::new("main.first");
        let target = StateId::new("main.second");
        assert_eq!(domain(Some(&source), &target), Some(StateId::new("main")));
    }

    #[test]
    fn domain_of_cross_tree_transition_is_root() {
        let source = StateId::new("main");
        let target = StateId::new("overlay");
        assert_eq!(domain(Some(&source), &target), None);
    }

    #[test]
    fn domain_of_self_transition_is_the_parent() {
        let id = StateId::new("main.first");
        assert_eq!(domain(Some(&id), &id), Some(StateId::new("main")));
    }

    #[test]
    fn domain_of_machine_level_transition_is_root() {
        assert_eq!(domain(None, &StateId::new("overlay")), None);
    }

    #[test]
    fn exit_set_is_innermost_first() {
        let def = overlay_machine();
        let order = order_of(&def);
        let config = vec![StateId::new("main.first")];

        let exits = exit_set(&config, None, &order);
        assert_eq!(
            exits,
            vec![StateId::new("main.first"), StateId::new("main")]
        );

        let scoped = exit_set(&config, Some(&StateId::new("main")), &order);
        assert_eq!(scoped, vec![StateId::new("main.first")]);
    }

    #[test]
    fn exit_set_ignores_leaves_outside_the_domain() {
        let def = overlay_machine();
        let order = order_of(&def);
        let config = vec![StateId::new("main.first"), StateId::new("overlay.overlay")];

        let exits = exit_set(&config, Some(&StateId::new("main")), &order);
        assert_eq!(exits, vec![StateId::new("main.first")]);
    }

    #[test]
    fn entry_plan_completes_compound_defaults() {
        let def = overlay_machine();
        let plan = entry_plan(&def, None, &StateId::new("main"), &BTreeMap::new()).unwrap();

        assert_eq!(
            plan.nodes,
            vec![StateId::new("main"), StateId::new("main.first")]
        );
        assert_eq!(plan.leaves, vec![StateId::new("main.first")]);
        assert_eq!(plan.target, StateId::new("main"));
    }

    #[test]
    fn history_target_falls_back_to_default_before_first_exit() {
        let def = overlay_machine();
        let plan = entry_plan(&def, None, &StateId::new("main.hist"), &BTreeMap::new()).unwrap();
        assert_eq!(plan.target, StateId::new("main.first"));
        assert_eq!(plan.leaves, vec![StateId::new("main.first")]);
    }

    #[test]
    fn history_target_uses_the_recorded_child() {
        let def = overlay_machine();
        let mut history = BTreeMap::new();
        history.insert(StateId::new("main"), StateId::new("main.second"));

        let plan = entry_plan(&def, None, &StateId::new("main.hist"), &history).unwrap();
        assert_eq!(plan.target, StateId::new("main.second"));
        assert_eq!(
            plan.nodes,
            vec![StateId::new("main"), StateId::new("main.second")]
        );
    }

    #[test]
    fn entry_plan_enters_every_parallel_region() {
        let def = MachineBuilder::new("para")
            .initial("both")
            .state(
                StateBuilder::new("both")
                    .parallel()
                    .state(
                        StateBuilder::new("left")
                            .initial("l1")
                            .state(StateBuilder::new("l1"))
                            .state(StateBuilder::new("l2")),
                    )
                    .state(
                        StateBuilder::new("right")
                            .initial("r1")
                            .state(StateBuilder::new("r1")),
                    ),
            )
            .build()
            .unwrap();

        let plan = entry_plan(&def, None, &StateId::new("both"), &BTreeMap::new()).unwrap();
        assert_eq!(
            plan.leaves,
            vec![StateId::new("both.left.l1"), StateId::new("both.right.r1")]
        );
    }

    #[test]
    fn update_config_replaces_leaves_inside_the_domain() {
        let def = overlay_machine();
        let order = order_of(&def);
        let config = vec![StateId::new("main.first")];

        let next = update_config(
            &config,
            Some(&StateId::new("main")),
            &[StateId::new("main.second")],
            &order,
        );
        assert_eq!(next, vec![StateId::new("main.second")]);
    }

    #[test]
    fn active_child_finds_the_immediate_child_on_a_leaf_path() {
        let config = vec![StateId::new("main.first")];
        assert_eq!(
            active_child(&config, &StateId::new("main")),
            Some(StateId::new("main.first"))
        );
        assert_eq!(active_child(&config, &StateId::new("overlay")), None);
    }

    #[test]
    fn selection_stops_at_the_nearest_matching_level() {
        let def = overlay_machine();
        let registry = HandlerRegistry::new();
        let config = vec![StateId::new("main.first")];
        let ctx = Context::new();

        // NEXT is handled by the leaf itself.
        let picked = select(&def, &config, &ctx, &registry, &Event::new("NEXT")).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].source, Some(StateId::new("main.first")));

        // SHOW_OVERLAY bubbles to the compound parent.
        let picked = select(&def, &config, &ctx, &registry, &Event::new("SHOW_OVERLAY")).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].source, Some(StateId::new("main")));

        // Unknown events select nothing.
        let picked = select(&def, &config, &ctx, &registry, &Event::new("NOPE")).unwrap();
        assert!(picked.is_empty());
    }

    #[test]
    fn guard_false_at_matching_level_does_not_fall_through() {
        let def = MachineBuilder::new("shadow")
            .initial("outer")
            .state(
                StateBuilder::new("outer")
                    .initial("inner")
                    .on("GO", TransitionBuilder::to("elsewhere"))
                    .state(
                        StateBuilder::new("inner")
                            .on("GO", TransitionBuilder::to("sibling").guard("never")),
                    )
                    .state(StateBuilder::new("sibling")),
            )
            .state(StateBuilder::new("elsewhere"))
            .build()
            .unwrap();

        let mut registry = HandlerRegistry::new();
        registry.register_guard("never", |_, _| Ok(false));

        let config = vec![StateId::new("outer.inner")];
        let picked = select(&def, &config, &Context::new(), &registry, &Event::new("GO")).unwrap();
        assert!(picked.is_empty());
    }

    #[test]
    fn first_guard_true_row_wins() {
        let def = MachineBuilder::new("rows")
            .initial("start")
            .state(
                StateBuilder::new("start")
                    .on("GO", TransitionBuilder::to("a").guard("no"))
                    .on("GO", TransitionBuilder::to("b").guard("yes"))
                    .on("GO", TransitionBuilder::to("c")),
            )
            .state(StateBuilder::new("a"))
            .state(StateBuilder::new("b"))
            .state(StateBuilder::new("c"))
            .build()
            .unwrap();

        let mut registry = HandlerRegistry::new();
        registry.register_guard("no", |_, _| Ok(false));
        registry.register_guard("yes", |_, _| Ok(true));

        let config = vec![StateId::new("start")];
        let picked = select(&def, &config, &Context::new(), &registry, &Event::new("GO")).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].transition.target.as_deref(), Some("b"));
    }

    #[test]
    fn machine_level_table_is_the_outermost_fallback() {
        let def = MachineBuilder::new("global")
            .initial("a")
            .state(StateBuilder::new("a"))
            .state(StateBuilder::new("b"))
            .on("RESET", TransitionBuilder::to("a"))
            .build()
            .unwrap();

        let registry = HandlerRegistry::new();
        let config = vec![StateId::new("b")];
        let picked = select(&def, &config, &Context::new(), &registry, &Event::new("RESET")).unwrap();
        assert_eq!(picked.len(), 1);
        assert!(picked[0].source.is_none());
    }
}
