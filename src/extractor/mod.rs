//! Sources of raw entity lists.
//!
//! The poller only depends on the [`Extractor`] trait. [`JsonExtractor`]
//! is the bundled implementation that reads a JSON document over HTTP.

mod json;

pub use json::{is_truthy, select_entities, JsonExtractor};

use crate::state::RawEntity;
use anyhow::Result;
use async_trait::async_trait;

/// Produces a fresh, ordered entity list on demand.
///
/// Implementations must be safe to call repeatedly from the poll loop.
/// Any error is treated as transient: the poller logs it and keeps the
/// last good snapshot.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Fetch the current entity list in source order
    async fn extract(&self) -> Result<Vec<RawEntity>>;
}
