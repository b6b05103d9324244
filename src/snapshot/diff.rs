//! Change detection between the current snapshot and a fresh extraction.
//!
//! Only `alert` transitions and entity count changes are significant.
//! Name-only edits never produce a new snapshot.

use crate::snapshot::Snapshot;
use crate::state::{default_name, EntityState, RawEntity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a fresh entity is paired with its predecessor in the current snapshot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchBy {
    /// Same index in extraction order
    #[default]
    Position,
    /// Same resolved name (first occurrence wins on duplicates)
    Name,
}

impl std::str::FromStr for MatchBy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "position" => Ok(MatchBy::Position),
            "name" => Ok(MatchBy::Name),
            other => anyhow::bail!("unknown match mode '{}'", other),
        }
    }
}

/// Result of comparing a fresh extraction against the current snapshot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffOutcome {
    /// True iff the entity count or any entity's `alert` changed
    pub changed: bool,

    /// Candidate next snapshot (only meaningful to publish when `changed`)
    pub next: Snapshot,
}

/// Positional diff (entity `i` is compared with current entity `i`)
pub fn diff(current: &Snapshot, fresh: &[RawEntity], now: DateTime<Utc>) -> DiffOutcome {
    diff_with(current, fresh, now, MatchBy::Position)
}

/// Diff with an explicit predecessor matching mode
///
/// `now` becomes the snapshot's `taken_at` and the `changed_at` of every
/// entity whose `alert` differs from its predecessor (or has none). All
/// other entities carry their predecessor's `changed_at` forward untouched.
pub fn diff_with(
    current: &Snapshot,
    fresh: &[RawEntity],
    now: DateTime<Utc>,
    match_by: MatchBy,
) -> DiffOutcome {
    let by_name = match match_by {
        MatchBy::Position => None,
        MatchBy::Name => {
            let mut index: HashMap<&str, &EntityState> = HashMap::new();
            for entity in &current.entities {
                index.entry(entity.name.as_str()).or_insert(entity);
            }
            Some(index)
        }
    };

    let mut changed = fresh.len() != current.entities.len();

    let entities = fresh
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            let id = idx as u32 + 1;
            let name = resolve_name(&raw.name, id);

            let previous = match &by_name {
                None => current.entities.get(idx),
                Some(index) => index.get(name.as_str()).copied(),
            };

            let changed_at = match previous {
                Some(prev) if prev.alert == raw.alert => prev.changed_at,
                _ => {
                    changed = true;
                    now
                }
            };

            EntityState {
                id,
                name,
                alert: raw.alert,
                changed_at,
            }
        })
        .collect();

    DiffOutcome {
        changed,
        next: Snapshot {
            taken_at: now,
            entities,
        },
    }
}

fn resolve_name(raw: &str, id: u32) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        default_name(id)
    } else {
        trimmed.to_string()
    }
}
