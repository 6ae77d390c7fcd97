//! Append-only log of committed transitions.

use crate::core::StateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One committed transition. `source` is the node whose table matched the
/// event, `None` when the machine-level table handled it; `target` is the
/// fully resolved state the machine settled into.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<StateId>,
    pub target: StateId,
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of committed transitions.
///
/// Recording returns a new log rather than mutating in place, so a failed
/// step can drop its working copy. Internal (targetless) transitions and
/// ignored events are not recorded.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceLog {
    records: Vec<TransitionRecord>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, returning the extended log.
    pub fn record(&self, record: TransitionRecord) -> Self {
        let mut records = self.records.clone();
        records.push(record);
        Self { records }
    }

    pub fn records(&self) -> &[TransitionRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
