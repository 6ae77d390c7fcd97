//! The statechart runtime.
//!
//! [`Interpreter`] executes a validated [`crate::core::MachineDefinition`]:
//! it holds the active configuration and context, processes one event at a
//! time with run-to-completion semantics, resolves history, and owns the
//! actors spawned by active states.

mod actor;
mod error;
mod machine;
mod plan;
mod trace;

pub use actor::{Actor, ActorStatus, SpawnError};
pub use error::TransitionError;
pub use machine::{Interpreter, Snapshot, INIT_EVENT};
pub use trace::{TraceLog, TransitionRecord};
