//! Spawned child machine instances and their lifecycle.
//!
//! An actor is owned by exactly one state node, keyed by that node's id in
//! the parent interpreter's actor table. It lives only while its owner is
//! active: exiting the owner (or any ancestor) stops it unconditionally.

use crate::core::{DefinitionError, Event, StateId};
use crate::interpreter::error::TransitionError;
use crate::interpreter::machine::{Interpreter, Snapshot};
use crate::registry::{HandlerError, HandlerRegistry, SpawnRequest};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Why an actor could not be brought up.
///
/// Spawn failures never abort the owning transition; the interpreter writes
/// the error's display into the `error` context field and the owner
/// proceeds with no actor attached.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("spawner '{spawner}' failed: {reason}")]
    HandlerFailed {
        spawner: String,
        #[source]
        reason: HandlerError,
    },

    #[error("spawned machine '{machine}' is invalid: {source}")]
    InvalidDefinition {
        machine: String,
        #[source]
        source: DefinitionError,
    },

    #[error("spawned machine '{machine}' failed to start: {source}")]
    StartFailed {
        machine: String,
        #[source]
        source: Box<TransitionError>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorStatus {
    Running,
    Stopped,
}

/// A live nested interpreter bound to its owning state node.
#[derive(Debug)]
pub struct Actor {
    id: Uuid,
    owner: StateId,
    status: ActorStatus,
    machine: Option<Interpreter>,
}

impl Actor {
    /// Construct and start the child machine described by a spawn request.
    /// The child begins processing its own initial entry before this
    /// returns, inside the parent's step.
    pub(crate) fn spawn(
        owner: StateId,
        request: SpawnRequest,
        registry: Arc<HandlerRegistry>,
    ) -> Result<Self, SpawnError> {
        let machine_id = request.definition.id.clone();
        let mut machine =
            Interpreter::with_context(request.definition, registry, request.context).map_err(
                |source| SpawnError::InvalidDefinition {
                    machine: machine_id.clone(),
                    source,
                },
            )?;
        machine.start().map_err(|source| SpawnError::StartFailed {
            machine: machine_id,
            source: Box::new(source),
        })?;

        let actor = Self {
            id: Uuid::new_v4(),
            owner,
            status: ActorStatus::Running,
            machine: Some(machine),
        };
        tracing::debug!(actor = %actor.id, owner = %actor.owner, "actor spawned");
        Ok(actor)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> &StateId {
        &self.owner
    }

    pub fn status(&self) -> ActorStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == ActorStatus::Running
    }

    /// Stop the actor and discard its machine. Idempotent.
    pub(crate) fn stop(&mut self) {
        if self.status == ActorStatus::Stopped {
            return;
        }
        self.status = ActorStatus::Stopped;
        self.machine = None;
        tracing::debug!(actor = %self.id, owner = %self.owner, "actor stopped");
    }

    /// Relay an event into the child machine.
    ///
    /// Forwarding to a stopped actor is a silent no-op, and an event the
    /// child rejects leaves the child unchanged; neither disturbs the
    /// parent's step.
    pub fn forward(&mut self, event: Event) {
        match &mut self.machine {
            Some(machine) => {
                if let Err(error) = machine.send(event) {
                    tracing::warn!(
                        actor = %self.id,
                        owner = %self.owner,
                        %error,
                        "forwarded event rejected by actor"
                    );
                }
            }
            None => {
                tracing::debug!(actor = %self.id, owner = %self.owner, "forward to stopped actor ignored");
            }
        }
    }

    /// Read the child machine's current snapshot, `None` once stopped.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.machine.as_ref().map(|m| m.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{MachineBuilder, StateBuilder, TransitionBuilder};
    use crate::core::Context;
    use serde_json::json;

    fn child_request() -> SpawnRequest {
        let definition = MachineBuilder::new("child")
            .initial("idle")
            .state(StateBuilder::new("idle").on("GO", TransitionBuilder::to("busy")))
            .state(StateBuilder::new("busy"))
            .build()
            .unwrap();
        SpawnRequest::new(
            Arc::new(definition),
            Context::new().with("seed", json!("value")),
        )
    }

    #[test]
    fn spawn_starts_the_child_machine() {
        let actor = Actor::spawn(
            StateId::new("owner"),
            child_request(),
            Arc::new(HandlerRegistry::new()),
        )
        .unwrap();

        assert!(actor.is_running());
        let snapshot = actor.snapshot().unwrap();
        assert!(snapshot.matches("idle"));
        assert_eq!(snapshot.context.get("seed"), Some(&json!("value")));
    }

    #[test]
    fn forward_drives_the_child() {
        let mut actor = Actor::spawn(
            StateId::new("owner"),
            child_request(),
            Arc::new(HandlerRegistry::new()),
        )
        .unwrap();

        actor.forward(Event::new("GO"));
        assert!(actor.snapshot().unwrap().matches("busy"));
    }

    #[test]
    fn stop_is_idempotent_and_discards_the_machine() {
        let mut actor = Actor::spawn(
            StateId::new("owner"),
            child_request(),
            Arc::new(HandlerRegistry::new()),
        )
        .unwrap();

        actor.stop();
        assert!(!actor.is_running());
        assert!(actor.snapshot().is_none());

        // Second stop and a late forward are both no-ops.
        actor.stop();
        actor.forward(Event::new("GO"));
        assert_eq!(actor.status(), ActorStatus::Stopped);
    }

    #[test]
    fn spawn_rejects_an_invalid_child_definition() {
        let broken = MachineBuilder::new("broken")
            .initial("missing")
            .state(StateBuilder::new("idle"))
            .build()
            .unwrap();
        let request = SpawnRequest::new(Arc::new(broken), Context::new());

        let result = Actor::spawn(
            StateId::new("owner"),
            request,
            Arc::new(HandlerRegistry::new()),
        );
        assert!(matches!(result, Err(SpawnError::InvalidDefinition { .. })));
    }
}
