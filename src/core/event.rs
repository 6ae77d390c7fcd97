//! Events that drive the interpreter.
//!
//! An event is the only input that can cause a transition. It carries a
//! type discriminant and an optional JSON payload that guards and actions
//! can inspect.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An immutable typed message consumed by exactly one interpreter step.
///
/// # Example
///
/// ```rust
/// use strata::core::Event;
/// use serde_json::json;
///
/// let plain = Event::new("CONTINUE");
/// assert!(plain.payload.is_null());
///
/// let with_data = Event::with_payload("START_SPV", json!({ "isSPV": true }));
/// assert!(with_data.flag("isSPV"));
/// assert!(!with_data.flag("isAdvancedDaemon"));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Discriminant matched against transition tables.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Optional payload, `Value::Null` when absent.
    #[serde(default)]
    pub payload: Value,
}

impl Event {
    /// Create an event with no payload.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            payload: Value::Null,
        }
    }

    /// Create an event carrying a payload value.
    pub fn with_payload(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    /// Look up a field of an object payload.
    ///
    /// Returns `None` when the payload is not an object or the field is
    /// missing.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    /// Whether the payload object contains the field at all, regardless of
    /// its value. Used by assign policies that distinguish an absent field
    /// from an explicitly false or null one.
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Truthiness of a payload field, with missing fields counting as false.
    pub fn flag(&self, name: &str) -> bool {
        self.field(name).map(truthy).unwrap_or(false)
    }
}

/// JavaScript-style truthiness for a JSON value.
///
/// Null, `false`, `0` and the empty string are falsy; everything else,
/// including empty arrays and objects, is truthy. The bundled workflow's
/// guards and assign policies were written against these rules.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
