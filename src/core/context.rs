//! The per-instance data bag and the patches that update it.
//!
//! A context is never mutated in place by handlers. Assign actions return a
//! [`ContextPatch`] and the interpreter folds the patches of a step into a
//! fresh context, so a failed step can discard its working copy without a
//! trace.

use crate::core::event::truthy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Snapshot value holding a machine instance's data fields.
///
/// Field order is deterministic. Updates go through [`Context::apply`],
/// which returns a new context and leaves the original untouched.
///
/// # Example
///
/// ```rust
/// use strata::core::{Context, ContextPatch};
/// use serde_json::json;
///
/// let ctx = Context::new()
///     .with("error", json!(null))
///     .with("isSPV", json!(null));
///
/// let patch = ContextPatch::new().set("isSPV", json!(true));
/// let next = ctx.apply(&patch);
///
/// assert_eq!(ctx.get("isSPV"), Some(&json!(null)));
/// assert_eq!(next.get("isSPV"), Some(&json!(true)));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    fields: BTreeMap<String, Value>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Consume the context, returning it with one field set. Intended for
    /// building initial contexts.
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    /// Build from a JSON object value; backs the [`crate::context!`] macro.
    /// Anything but an object yields an empty context.
    pub fn from_object(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                fields: map.into_iter().collect(),
            },
            _ => Self::new(),
        }
    }

    /// Read a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Whether the field exists, even if null.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Truthiness of a field, with missing fields counting as false.
    pub fn flag(&self, field: &str) -> bool {
        self.get(field).map(truthy).unwrap_or(false)
    }

    /// Apply a patch, returning the updated context. Entries are applied in
    /// patch order, so a later write to the same field wins.
    pub fn apply(&self, patch: &ContextPatch) -> Self {
        let mut next = self.clone();
        for (field, value) in patch.entries() {
            next.fields.insert(field.clone(), value.clone());
        }
        next
    }

    /// Iterate fields in deterministic order.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Ordered partial update produced by an assign handler.
///
/// Within one step the interpreter applies patches left to right, so the
/// last write to a field within that step wins. A handler that wants to
/// keep a field's prior value simply omits it from the patch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextPatch {
    entries: Vec<(String, Value)>,
}

impl ContextPatch {
    /// Create an empty patch. An empty patch is a valid no-op.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a field assignment.
    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.entries.push((field.into(), value));
        self
    }

    /// Build from a JSON object value; backs the [`crate::patch!`] macro.
    /// Anything but an object yields an empty patch.
    pub fn from_object(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                entries: map.into_iter().collect(),
            },
            _ => Self::new(),
        }
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
