//! Builder API for assembling machine documents.
//!
//! Documents can be written as JSON and deserialized, but Rust callers
//! usually assemble them with these fluent builders. Builder errors cover
//! local misuse; the full structural validation runs when an interpreter
//! is constructed over the finished definition.

pub mod error;
pub mod machine;
pub mod macros;
pub mod state;
pub mod transition;

pub use error::BuildError;
pub use machine::MachineBuilder;
pub use state::StateBuilder;
pub use transition::TransitionBuilder;
