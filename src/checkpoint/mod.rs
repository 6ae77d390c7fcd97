//! Checkpoint and resume functionality for interpreters.
//!
//! A checkpoint captures the serializable portion of a live interpreter:
//! active configuration, context, history records, and the transition
//! trace. It does NOT capture actors; their definitions and context
//! projections belong to the spawners, so a restored interpreter sits in
//! the recorded configuration without respawning them.

use crate::core::{Context, StateId};
use crate::interpreter::TraceLog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for the checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of an interpreter, produced by
/// [`crate::interpreter::Interpreter::checkpoint`] and consumed by
/// [`crate::interpreter::Interpreter::restore`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When the checkpoint was taken
    pub timestamp: DateTime<Utc>,

    /// Id of the machine document the checkpoint belongs to
    pub machine: String,

    /// Active leaf states, one per orthogonal region
    pub active: Vec<StateId>,

    /// Context at capture time
    pub context: Context,

    /// History records for compound nodes
    pub history: BTreeMap<StateId, StateId>,

    /// Committed transition trace
    pub trace: TraceLog,
}

impl Checkpoint {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from JSON, rejecting unsupported versions.
    pub fn from_json(text: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Checkpoint = serde_json::from_str(text)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: checkpoint.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{MachineBuilder, StateBuilder, TransitionBuilder};
    use crate::core::Event;
    use crate::interpreter::Interpreter;
    use crate::registry::HandlerRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn overlay_machine() -> Arc<crate::core::MachineDefinition> {
        Arc::new(
            MachineBuilder::new("overlay")
                .initial("main")
                .context_field("error", json!(null))
                .state(
                    StateBuilder::new("main")
                        .initial("first")
                        .on("AWAY", TransitionBuilder::to("overlay"))
                        .state(
                            StateBuilder::new("first").on("NEXT", TransitionBuilder::to("second")),
                        )
                        .state(StateBuilder::new("second"))
                        .state(StateBuilder::history("hist")),
                )
                .state(
                    StateBuilder::new("overlay")
                        .initial("overlay")
                        .on("BACK", TransitionBuilder::to("main.hist"))
                        .state(StateBuilder::new("overlay")),
                )
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn checkpoint_roundtrip_restores_configuration_and_history() {
        let definition = overlay_machine();
        let registry = Arc::new(HandlerRegistry::new());

        let mut interpreter =
            Interpreter::new(Arc::clone(&definition), Arc::clone(&registry)).unwrap();
        interpreter.start().unwrap();
        interpreter.send(Event::new("NEXT")).unwrap();
        interpreter.send(Event::new("AWAY")).unwrap();

        let json_text = interpreter.checkpoint().to_json().unwrap();
        let checkpoint = Checkpoint::from_json(&json_text).unwrap();

        let mut restored = Interpreter::restore(definition, registry, checkpoint).unwrap();
        assert!(restored.is_started());
        assert_eq!(restored.snapshot(), interpreter.snapshot());
        assert_eq!(restored.trace(), interpreter.trace());

        // History survives: BACK goes to the recorded child, not the default.
        let snapshot = restored.send(Event::new("BACK")).unwrap();
        assert_eq!(snapshot.active, vec![StateId::new("main.second")]);
    }

    #[test]
    fn restore_rejects_a_checkpoint_from_another_machine() {
        let definition = overlay_machine();
        let registry = Arc::new(HandlerRegistry::new());
        let mut interpreter =
            Interpreter::new(Arc::clone(&definition), Arc::clone(&registry)).unwrap();
        interpreter.start().unwrap();

        let mut checkpoint = interpreter.checkpoint();
        checkpoint.machine = "somethingElse".to_string();

        let result = Interpreter::restore(definition, registry, checkpoint);
        assert!(matches!(result, Err(CheckpointError::MachineMismatch { .. })));
    }

    #[test]
    fn restore_rejects_unknown_states() {
        let definition = overlay_machine();
        let registry = Arc::new(HandlerRegistry::new());
        let mut interpreter =
            Interpreter::new(Arc::clone(&definition), Arc::clone(&registry)).unwrap();
        interpreter.start().unwrap();

        let mut checkpoint = interpreter.checkpoint();
        checkpoint.active = vec![StateId::new("main.ghost")];

        let result = Interpreter::restore(definition, registry, checkpoint);
        assert!(matches!(result, Err(CheckpointError::UnknownState(_))));
    }

    #[test]
    fn from_json_rejects_future_versions() {
        let definition = overlay_machine();
        let registry = Arc::new(HandlerRegistry::new());
        let mut interpreter = Interpreter::new(definition, registry).unwrap();
        interpreter.start().unwrap();

        let mut checkpoint = interpreter.checkpoint();
        checkpoint.version = CHECKPOINT_VERSION + 1;
        let text = serde_json::to_string(&checkpoint).unwrap();

        let result = Checkpoint::from_json(&text);
        assert!(matches!(
            result,
            Err(CheckpointError::UnsupportedVersion { .. })
        ));
    }
}
