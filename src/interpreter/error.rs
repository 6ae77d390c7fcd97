//! Runtime step errors.

use crate::registry::HandlerError;
use thiserror::Error;

/// A rejected `send` (or `start`).
///
/// A step either applies completely or not at all: when any of these are
/// returned, the active configuration, context, history, and actor table
/// are exactly what they were before the call.
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("interpreter has not been started")]
    NotStarted,

    #[error("guard '{guard}' failed while handling '{event}': {reason}")]
    GuardFailed {
        guard: String,
        event: String,
        #[source]
        reason: HandlerError,
    },

    #[error("action '{action}' failed while handling '{event}': {reason}")]
    ActionFailed {
        action: String,
        event: String,
        #[source]
        reason: HandlerError,
    },

    // Targets are resolved when the interpreter is constructed, so this is
    // a definition/runtime mismatch that should not happen in practice.
    #[error("transition target '{target}' did not resolve at runtime")]
    UnresolvedTarget { target: String },
}
