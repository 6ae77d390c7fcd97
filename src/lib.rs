//! Strata: a hierarchical statechart interpreter.
//!
//! Strata executes nested finite-state machines with guarded transitions,
//! entry/exit actions, spawned child machine instances ("actors"), and
//! history pseudostates. Machine documents are plain serializable data;
//! guards, actions, and spawners are referenced by symbolic name and
//! resolved against a [`registry::HandlerRegistry`] the application
//! populates. Processing is synchronous and run-to-completion: one `send`
//! handles one event fully, and long-running external work re-enters the
//! machine as ordinary follow-up events.
//!
//! # Core Concepts
//!
//! - **MachineDefinition**: the immutable state tree plus transition
//!   tables, validated when an interpreter is constructed
//! - **Interpreter**: the runtime holding the active configuration,
//!   context, history records, and actors
//! - **Handlers**: pure functions resolved by name at call time
//!
//! # Example
//!
//! ```rust
//! use strata::builder::{MachineBuilder, StateBuilder, TransitionBuilder};
//! use strata::interpreter::Interpreter;
//! use strata::registry::HandlerRegistry;
//! use strata::core::Event;
//! use strata::patch;
//! use std::sync::Arc;
//!
//! let definition = MachineBuilder::new("door")
//!     .initial("closed")
//!     .state(StateBuilder::new("closed").on(
//!         "OPEN",
//!         TransitionBuilder::to("open").assign("noteOpened"),
//!     ))
//!     .state(StateBuilder::new("open").on("CLOSE", TransitionBuilder::to("closed")))
//!     .build()
//!     .unwrap();
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register_action("noteOpened", |_, _| Ok(patch! { "opened": true }));
//!
//! let mut interpreter = Interpreter::new(Arc::new(definition), Arc::new(registry)).unwrap();
//! interpreter.start().unwrap();
//!
//! let snapshot = interpreter.send(Event::new("OPEN")).unwrap();
//! assert!(snapshot.matches("open"));
//! assert!(snapshot.context.flag("opened"));
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod interpreter;
pub mod registry;
pub mod workflows;

// Re-export commonly used types
pub use builder::{BuildError, MachineBuilder, StateBuilder, TransitionBuilder};
pub use checkpoint::{Checkpoint, CheckpointError};
pub use core::{
    Context, ContextPatch, DefinitionError, Event, MachineDefinition, StateId, StateKind,
};
pub use interpreter::{Actor, Interpreter, Snapshot, SpawnError, TransitionError};
pub use registry::{HandlerError, HandlerRegistry, SpawnRequest};
