//! The execution engine.
//!
//! One `send` processes one event to completion: select the transitions,
//! compute exit and entry sets, run every handler against a working copy of
//! the context, and only then commit configuration, context, history,
//! trace, and actor operations. A guard or assign failure therefore leaves
//! the interpreter exactly as it was.

use crate::checkpoint::{Checkpoint, CheckpointError, CHECKPOINT_VERSION};
use crate::core::{
    ActionDef, Context, ContextPatch, DefinitionError, Event, MachineDefinition, StateId,
    StateKind,
};
use crate::interpreter::actor::{Actor, SpawnError};
use crate::interpreter::error::TransitionError;
use crate::interpreter::plan;
use crate::interpreter::trace::{TraceLog, TransitionRecord};
use crate::registry::{HandlerError, HandlerRegistry};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use uuid::Uuid;

/// Event type handed to entry actions of the initial configuration.
pub const INIT_EVENT: &str = "strata.init";

/// Read-only view of an interpreter: the active leaf states (one per
/// orthogonal region, in document order) and a copy of the context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub active: Vec<StateId>,
    pub context: Context,
}

impl Snapshot {
    /// Whether the given state, or any descendant of it, is active.
    ///
    /// ```rust
    /// # use strata::interpreter::Snapshot;
    /// # use strata::core::{Context, StateId};
    /// let snapshot = Snapshot {
    ///     active: vec![StateId::new("startMachine.choosingWallet")],
    ///     context: Context::new(),
    /// };
    /// assert!(snapshot.matches("startMachine"));
    /// assert!(snapshot.matches("startMachine.choosingWallet"));
    /// assert!(!snapshot.matches("settings"));
    /// ```
    pub fn matches(&self, path: &str) -> bool {
        let id = StateId::new(path);
        self.active
            .iter()
            .any(|leaf| *leaf == id || id.is_ancestor_of(leaf))
    }

    /// The first active leaf. Machines without parallel regions have
    /// exactly one.
    pub fn leaf(&self) -> Option<&StateId> {
        self.active.first()
    }
}

enum ActorOp {
    Stop(StateId),
    Insert(Actor),
    Forward(StateId),
}

/// Runtime for one machine instance.
///
/// Holds the active configuration, the context, history records for
/// compound nodes, and the actors spawned by active states. All of it is
/// touched only inside `start`/`send`; callers observe it through
/// [`Snapshot`]s.
#[derive(Debug)]
pub struct Interpreter {
    definition: Arc<MachineDefinition>,
    registry: Arc<HandlerRegistry>,
    context: Context,
    configuration: Vec<StateId>,
    history: BTreeMap<StateId, StateId>,
    actors: BTreeMap<StateId, Actor>,
    trace: TraceLog,
    queue: VecDeque<Event>,
    order: HashMap<StateId, usize>,
    started: bool,
}

impl Interpreter {
    /// Construct an interpreter over a validated definition, seeding the
    /// context from the document.
    pub fn new(
        definition: Arc<MachineDefinition>,
        registry: Arc<HandlerRegistry>,
    ) -> Result<Self, DefinitionError> {
        let context = definition.context.clone();
        Self::with_context(definition, registry, context)
    }

    /// Construct with an explicit context, as spawners do for actors.
    pub fn with_context(
        definition: Arc<MachineDefinition>,
        registry: Arc<HandlerRegistry>,
        context: Context,
    ) -> Result<Self, DefinitionError> {
        definition.validate(&registry)?;
        let order = definition
            .nodes()
            .into_iter()
            .enumerate()
            .map(|(idx, (id, _))| (id, idx))
            .collect();
        Ok(Self {
            definition,
            registry,
            context,
            configuration: Vec::new(),
            history: BTreeMap::new(),
            actors: BTreeMap::new(),
            trace: TraceLog::new(),
            queue: VecDeque::new(),
            order,
            started: false,
        })
    }

    pub fn definition(&self) -> &Arc<MachineDefinition> {
        &self.definition
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn trace(&self) -> &TraceLog {
        &self.trace
    }

    /// The actor owned by a state node, if one is attached.
    pub fn actor(&self, owner: &StateId) -> Option<&Actor> {
        self.actors.get(owner)
    }

    /// Last recorded active child of a compound node.
    pub fn history_record(&self, compound: &StateId) -> Option<&StateId> {
        self.history.get(compound)
    }

    /// Pure read of the current configuration and context.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            active: self.configuration.clone(),
            context: self.context.clone(),
        }
    }

    /// Enter the initial configuration, running entry actions from the
    /// outermost node down. Calling `start` again returns the current
    /// snapshot unchanged.
    pub fn start(&mut self) -> Result<Snapshot, TransitionError> {
        if self.started {
            return Ok(self.snapshot());
        }

        let definition = Arc::clone(&self.definition);
        let event = Event::new(INIT_EVENT);
        let initial = definition.initial.clone();
        let entry = plan::entry_plan(&definition, None, &initial, &self.history)?;

        let mut ctx = self.context.clone();
        let mut ops = Vec::new();
        self.run_entry_nodes(&definition, &entry.nodes, &mut ctx, &event, &mut ops)?;

        self.context = ctx;
        self.configuration = plan::update_config(&[], None, &entry.leaves, &self.order);
        self.started = true;
        self.apply_actor_ops(ops, &event);
        tracing::debug!(machine = %definition.id, active = ?self.configuration, "machine started");
        Ok(self.snapshot())
    }

    /// Process one event to completion and return the settled snapshot.
    ///
    /// Events synthesized while a step runs are queued and drained before
    /// `send` returns. An unmatched event is not an error: the snapshot
    /// comes back unchanged.
    pub fn send(&mut self, event: Event) -> Result<Snapshot, TransitionError> {
        if !self.started {
            return Err(TransitionError::NotStarted);
        }
        self.queue.push_back(event);
        while let Some(next) = self.queue.pop_front() {
            if let Err(error) = self.step(&next) {
                self.queue.clear();
                return Err(error);
            }
        }
        Ok(self.snapshot())
    }

    /// Capture the serializable portion of this interpreter. Actors are not
    /// captured; their definitions and contexts belong to the spawners.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            machine: self.definition.id.clone(),
            active: self.configuration.clone(),
            context: self.context.clone(),
            history: self.history.clone(),
            trace: self.trace.clone(),
        }
    }

    /// Rebuild an interpreter from a checkpoint taken against the same
    /// machine document. The restored instance is started and sits in the
    /// recorded configuration; actors are not respawned.
    pub fn restore(
        definition: Arc<MachineDefinition>,
        registry: Arc<HandlerRegistry>,
        checkpoint: Checkpoint,
    ) -> Result<Self, CheckpointError> {
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: checkpoint.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        if checkpoint.machine != definition.id {
            return Err(CheckpointError::MachineMismatch {
                expected: definition.id.clone(),
                found: checkpoint.machine,
            });
        }

        let mut interpreter = Self::new(definition, registry)
            .map_err(|error| CheckpointError::ValidationFailed(error.to_string()))?;

        for id in &checkpoint.active {
            match interpreter.definition.node(id) {
                Some(node) if node.kind == StateKind::Atomic => {}
                _ => return Err(CheckpointError::UnknownState(id.clone())),
            }
        }
        for (parent, child) in &checkpoint.history {
            if !interpreter.definition.contains(parent) || !interpreter.definition.contains(child)
            {
                return Err(CheckpointError::UnknownState(parent.clone()));
            }
        }

        interpreter.configuration =
            plan::update_config(&[], None, &checkpoint.active, &interpreter.order);
        interpreter.context = checkpoint.context;
        interpreter.history = checkpoint.history;
        interpreter.trace = checkpoint.trace;
        interpreter.started = !interpreter.configuration.is_empty();
        Ok(interpreter)
    }

    fn step(&mut self, event: &Event) -> Result<(), TransitionError> {
        let definition = Arc::clone(&self.definition);
        let registry = Arc::clone(&self.registry);
        let selections = plan::select(
            &definition,
            &self.configuration,
            &self.context,
            &registry,
            event,
        )?;
        if selections.is_empty() {
            tracing::debug!(event = %event.event_type, "event ignored, no matching transition");
            return Ok(());
        }

        let mut config = self.configuration.clone();
        let mut ctx = self.context.clone();
        let mut history = self.history.clone();
        let mut trace = self.trace.clone();
        let mut ops: Vec<ActorOp> = Vec::new();

        for selection in &selections {
            if let Some(source) = &selection.source {
                let still_active = config
                    .iter()
                    .any(|leaf| leaf == source || source.is_ancestor_of(leaf));
                if !still_active {
                    continue;
                }
            }

            let row = selection.transition;
            let Some(raw_target) = &row.target else {
                // Internal transition: actions only.
                self.run_action_list(&row.actions, &mut ctx, event, &mut ops, None)?;
                continue;
            };

            let target = definition
                .resolve_target(selection.source.as_ref(), raw_target)
                .ok_or_else(|| TransitionError::UnresolvedTarget {
                    target: raw_target.clone(),
                })?;
            let domain = plan::domain(selection.source.as_ref(), &target);

            let exits = plan::exit_set(&config, domain.as_ref(), &self.order);
            self.run_exit_nodes(&definition, &exits, &config, &mut ctx, event, &mut history, &mut ops)?;

            self.run_action_list(&row.actions, &mut ctx, event, &mut ops, None)?;

            let entry = plan::entry_plan(&definition, domain.as_ref(), &target, &history)?;
            self.run_entry_nodes(&definition, &entry.nodes, &mut ctx, event, &mut ops)?;

            config = plan::update_config(&config, domain.as_ref(), &entry.leaves, &self.order);
            trace = trace.record(TransitionRecord {
                event: event.event_type.clone(),
                source: selection.source.clone(),
                target: entry.target.clone(),
                timestamp: Utc::now(),
            });
            tracing::debug!(
                event = %event.event_type,
                target = %entry.target,
                "transition fired"
            );
        }

        self.configuration = config;
        self.context = ctx;
        self.history = history;
        self.trace = trace;
        self.apply_actor_ops(ops, event);
        Ok(())
    }

    fn run_exit_nodes(
        &self,
        definition: &MachineDefinition,
        exits: &[StateId],
        config: &[StateId],
        ctx: &mut Context,
        event: &Event,
        history: &mut BTreeMap<StateId, StateId>,
        ops: &mut Vec<ActorOp>,
    ) -> Result<(), TransitionError> {
        for id in exits {
            let node = definition
                .node(id)
                .ok_or_else(|| TransitionError::UnresolvedTarget {
                    target: id.to_string(),
                })?;
            self.run_action_list(&node.exit, ctx, event, ops, None)?;
            if node.kind == StateKind::Compound {
                if let Some(child) = plan::active_child(config, id) {
                    history.insert(id.clone(), child);
                }
            }
            ops.push(ActorOp::Stop(id.clone()));
        }
        Ok(())
    }

    fn run_entry_nodes(
        &self,
        definition: &MachineDefinition,
        entries: &[StateId],
        ctx: &mut Context,
        event: &Event,
        ops: &mut Vec<ActorOp>,
    ) -> Result<(), TransitionError> {
        for id in entries {
            let node = definition
                .node(id)
                .ok_or_else(|| TransitionError::UnresolvedTarget {
                    target: id.to_string(),
                })?;
            self.run_action_list(&node.entry, ctx, event, ops, Some(id))?;
        }
        Ok(())
    }

    fn run_action_list(
        &self,
        actions: &[ActionDef],
        ctx: &mut Context,
        event: &Event,
        ops: &mut Vec<ActorOp>,
        spawn_owner: Option<&StateId>,
    ) -> Result<(), TransitionError> {
        for action in actions {
            match action {
                ActionDef::Assign(name) => {
                    let handler = self.registry.action(name).ok_or_else(|| {
                        TransitionError::ActionFailed {
                            action: name.clone(),
                            event: event.event_type.clone(),
                            reason: HandlerError::new("action is not registered"),
                        }
                    })?;
                    let patch = handler(ctx, event).map_err(|reason| {
                        TransitionError::ActionFailed {
                            action: name.clone(),
                            event: event.event_type.clone(),
                            reason,
                        }
                    })?;
                    *ctx = ctx.apply(&patch);
                }
                ActionDef::Forward(owner) => {
                    ops.push(ActorOp::Forward(owner.clone()));
                }
                ActionDef::Spawn(name) => match spawn_owner {
                    Some(owner) => self.try_spawn(name, owner, ctx, event, ops),
                    None => {
                        return Err(TransitionError::ActionFailed {
                            action: name.clone(),
                            event: event.event_type.clone(),
                            reason: HandlerError::new("spawn is only allowed in entry actions"),
                        });
                    }
                },
            }
        }
        Ok(())
    }

    /// Attempt to spawn an actor for `owner`. Failure is threaded into the
    /// `error` context field instead of aborting the step.
    fn try_spawn(
        &self,
        name: &str,
        owner: &StateId,
        ctx: &mut Context,
        event: &Event,
        ops: &mut Vec<ActorOp>,
    ) {
        let result = self
            .registry
            .spawner(name)
            .ok_or_else(|| SpawnError::HandlerFailed {
                spawner: name.to_string(),
                reason: HandlerError::new("spawner is not registered"),
            })
            .and_then(|spawner| {
                spawner(ctx, event).map_err(|reason| SpawnError::HandlerFailed {
                    spawner: name.to_string(),
                    reason,
                })
            })
            .and_then(|request| Actor::spawn(owner.clone(), request, Arc::clone(&self.registry)));

        match result {
            Ok(actor) => ops.push(ActorOp::Insert(actor)),
            Err(error) => {
                tracing::warn!(owner = %owner, %error, "actor spawn failed");
                let patch = ContextPatch::new().set("error", Value::String(error.to_string()));
                *ctx = ctx.apply(&patch);
            }
        }
    }

    fn apply_actor_ops(&mut self, ops: Vec<ActorOp>, event: &Event) {
        for op in ops {
            match op {
                ActorOp::Stop(owner) => {
                    if let Some(mut actor) = self.actors.remove(&owner) {
                        actor.stop();
                    }
                }
                ActorOp::Insert(actor) => {
                    if let Some(mut replaced) = self.actors.insert(actor.owner().clone(), actor) {
                        replaced.stop();
                    }
                }
                ActorOp::Forward(owner) => match self.actors.get_mut(&owner) {
                    Some(actor) => actor.forward(event.clone()),
                    None => {
                        tracing::debug!(owner = %owner, "forward to absent actor ignored");
                    }
                },
            }
        }
    }
}
