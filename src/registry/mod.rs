//! The effect-handler seam between the engine and the application.
//!
//! Machine documents reference guards, actions, and spawners by symbolic
//! name; the surrounding application registers the matching functions here.
//! Handlers are pure: a guard maps (context, event) to a boolean, an action
//! to a context patch, a spawner to a spawn request. Anything with real
//! side effects runs outside the interpreter and re-enters as an event.

use crate::core::{Context, ContextPatch, Event, MachineDefinition};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure raised by a guard, action, or spawner handler.
///
/// The interpreter wraps it into a [`crate::interpreter::TransitionError`]
/// (guards and actions) or threads it into the `error` context field
/// (spawners).
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        HandlerError::new(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        HandlerError::new(message)
    }
}

/// What a spawner hands back: the child machine document and the context
/// projection it starts with. The child gets its own independent context,
/// never a reference into the parent's.
pub struct SpawnRequest {
    pub definition: Arc<MachineDefinition>,
    pub context: Context,
}

impl SpawnRequest {
    pub fn new(definition: Arc<MachineDefinition>, context: Context) -> Self {
        Self {
            definition,
            context,
        }
    }
}

type GuardHandler = Arc<dyn Fn(&Context, &Event) -> Result<bool, HandlerError> + Send + Sync>;
type ActionHandler =
    Arc<dyn Fn(&Context, &Event) -> Result<ContextPatch, HandlerError> + Send + Sync>;
type SpawnHandler =
    Arc<dyn Fn(&Context, &Event) -> Result<SpawnRequest, HandlerError> + Send + Sync>;

/// Named handler table shared by an interpreter and every actor it spawns.
///
/// # Example
///
/// ```rust
/// use strata::registry::HandlerRegistry;
/// use strata::core::ContextPatch;
/// use serde_json::json;
///
/// let mut registry = HandlerRegistry::new();
/// registry
///     .register_guard("hasSpvFlag", |_ctx, event| Ok(event.flag("isSPV")))
///     .register_action("assignSpvFromEvent", |_ctx, event| {
///         Ok(if event.flag("isSPV") {
///             ContextPatch::new().set("isSPV", json!(true))
///         } else {
///             ContextPatch::new()
///         })
///     });
///
/// assert!(registry.has_guard("hasSpvFlag"));
/// assert!(!registry.has_guard("somethingElse"));
/// ```
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    guards: HashMap<String, GuardHandler>,
    actions: HashMap<String, ActionHandler>,
    spawners: HashMap<String, SpawnHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pure predicate gating transitions.
    pub fn register_guard<F>(&mut self, name: impl Into<String>, guard: F) -> &mut Self
    where
        F: Fn(&Context, &Event) -> Result<bool, HandlerError> + Send + Sync + 'static,
    {
        self.guards.insert(name.into(), Arc::new(guard));
        self
    }

    /// Register a pure assign handler producing a context patch.
    pub fn register_action<F>(&mut self, name: impl Into<String>, action: F) -> &mut Self
    where
        F: Fn(&Context, &Event) -> Result<ContextPatch, HandlerError> + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(action));
        self
    }

    /// Register a spawner producing a child machine and its context
    /// projection.
    pub fn register_spawner<F>(&mut self, name: impl Into<String>, spawner: F) -> &mut Self
    where
        F: Fn(&Context, &Event) -> Result<SpawnRequest, HandlerError> + Send + Sync + 'static,
    {
        self.spawners.insert(name.into(), Arc::new(spawner));
        self
    }

    pub fn has_guard(&self, name: &str) -> bool {
        self.guards.contains_key(name)
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn has_spawner(&self, name: &str) -> bool {
        self.spawners.contains_key(name)
    }

    pub(crate) fn guard(&self, name: &str) -> Option<&GuardHandler> {
        self.guards.get(name)
    }

    pub(crate) fn action(&self, name: &str) -> Option<&ActionHandler> {
        self.actions.get(name)
    }

    pub(crate) fn spawner(&self, name: &str) -> Option<&SpawnHandler> {
        self.spawners.get(name)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&String> {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            keys
        }

        f.debug_struct("HandlerRegistry")
            .field("guards", &sorted_keys(&self.guards))
            .field("actions", &sorted_keys(&self.actions))
            .field("spawners", &sorted_keys(&self.spawners))
            .finish()
    }
}
