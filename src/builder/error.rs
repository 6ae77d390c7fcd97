//! Build errors for machine, state, and transition builders.

use thiserror::Error;

/// Errors that can occur while assembling a machine document.
///
/// These cover builder misuse only; deep structural validation (target
/// resolution, handler references, initial-child rules) happens when an
/// interpreter is constructed over the finished definition.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("No states defined. Add at least one state")]
    NoStates,

    #[error("State '{state}' declares an initial child but has no children")]
    InitialWithoutChildren { state: String },

    #[error("History state '{state}' must not have children")]
    HistoryWithChildren { state: String },

    #[error("Transition on '{event}' in '{state}' has no target and no actions")]
    EmptyTransition { state: String, event: String },
}
