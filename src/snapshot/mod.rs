use crate::state::EntityState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod diff;

pub use diff::{diff, diff_with, DiffOutcome, MatchBy};


/// Complete set of entity states captured by one poll
///
/// Snapshots are immutable once published; the store hands them out as
/// `Arc<Snapshot>` and replaces the whole value on change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Poll time at which this snapshot was computed
    pub taken_at: DateTime<Utc>,

    /// Entity states in extraction order
    pub entities: Vec<EntityState>,
}

impl Snapshot {
    /// Initial value before the first successful poll (epoch, no entities)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get entity count (for logging/display)
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of entities currently alerting
    pub fn alert_count(&self) -> usize {
        self.entities.iter().filter(|e| e.alert).count()
    }
}
