use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One monitored item as reported by the extractor, before diffing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntity {
    /// Label text as found in the source (may be empty)
    pub name: String,

    /// Whether the alert indicator was present
    pub alert: bool,
}

impl RawEntity {
    pub fn new(name: impl Into<String>, alert: bool) -> Self {
        Self {
            name: name.into(),
            alert,
        }
    }
}

/// Entity state as published in a snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityState {
    /// 1-indexed position in extraction order
    pub id: u32,

    /// Display label, never empty
    pub name: String,

    /// Monitored condition
    pub alert: bool,

    /// Time of the most recent `alert` transition for this entity
    pub changed_at: DateTime<Utc>,
}

/// Deterministic label used when the source yields no usable name
pub fn default_name(id: u32) -> String {
    format!("Entity #{}", id)
}
