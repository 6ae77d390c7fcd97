//! Bundled workflow definitions.
//!
//! The `get_started` machine drives the application bootstrap: starting or
//! connecting to a daemon, discovering or creating a wallet, unlocking and
//! syncing it, with overlay views (settings, logs, hardware-wallet
//! configuration) returning to the suspended step through history. The two
//! machines it spawns as actors live alongside it.

pub mod create_wallet;
pub mod get_started;
pub mod setup_wallet;

use crate::core::Event;
use serde_json::Value;

/// Payload field as an owned value, `Null` when absent. The workflow's
/// assign policies treat a missing field and an explicit null alike.
pub(crate) fn event_value(event: &Event, field: &str) -> Value {
    event.field(field).cloned().unwrap_or(Value::Null)
}
