//! Core data model of the statechart engine.
//!
//! Everything here is plain data: events, contexts and patches, the state
//! tree, and the machine document with its cold validation. The runtime
//! behavior lives in [`crate::interpreter`].

mod context;
mod definition;
mod event;
mod state;

pub use context::{Context, ContextPatch};
pub use definition::{DefinitionError, DefinitionViolation, MachineDefinition};
pub use event::{truthy, Event};
pub use state::{ActionDef, StateId, StateKind, StateNode, TransitionDef};
