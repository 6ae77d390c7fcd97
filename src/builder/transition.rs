//! Builder for transition table rows.

use crate::builder::error::BuildError;
use crate::core::{ActionDef, StateId, TransitionDef};

/// Fluent builder for one row of a transition table.
///
/// # Example
///
/// ```rust
/// use strata::builder::TransitionBuilder;
///
/// // Guarded transition with an assign action.
/// let row = TransitionBuilder::to("startSpv")
///     .guard("hasSpvFlag")
///     .assign("assignSpvFromEvent");
///
/// // Internal transition: actions run, nothing is exited or entered.
/// let nudge = TransitionBuilder::internal().forward("creatingWallet.creatingWallet");
/// ```
#[derive(Clone, Debug, Default)]
pub struct TransitionBuilder {
    target: Option<String>,
    guard: Option<String>,
    actions: Vec<ActionDef>,
}

impl TransitionBuilder {
    /// Start a transition targeting a state, absolute or relative to the
    /// source's parent.
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            guard: None,
            actions: Vec::new(),
        }
    }

    /// Start an internal transition with no target.
    pub fn internal() -> Self {
        Self::default()
    }

    /// Gate the row behind a registered guard.
    pub fn guard(mut self, name: impl Into<String>) -> Self {
        self.guard = Some(name.into());
        self
    }

    /// Append a registered assign action.
    pub fn assign(mut self, name: impl Into<String>) -> Self {
        self.actions.push(ActionDef::Assign(name.into()));
        self
    }

    /// Append a forward action relaying the event to the actor owned by
    /// the given state.
    pub fn forward(mut self, owner: impl Into<StateId>) -> Self {
        self.actions.push(ActionDef::Forward(owner.into()));
        self
    }

    pub(crate) fn build(self, state: &str, event: &str) -> Result<TransitionDef, BuildError> {
        if self.target.is_none() && self.actions.is_empty() {
            return Err(BuildError::EmptyTransition {
                state: state.to_string(),
                event: event.to_string(),
            });
        }
        Ok(TransitionDef {
            guard: self.guard,
            target: self.target,
            actions: self.actions,
        })
    }
}
