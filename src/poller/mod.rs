//! Recurring extract → diff → store → broadcast loop.
//!
//! The loop runs one tick at a time: the next extraction never starts
//! before the previous tick has stored and broadcast its result. Source
//! failures are logged and the last good snapshot stays current.

use crate::broadcast::Broadcaster;
use crate::config::PollerConfig;
use crate::extractor::Extractor;
use crate::snapshot::{diff_with, MatchBy};
use crate::state::SnapshotStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info};

/// Status information for the poll loop
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollStatus {
    /// Start of the most recent tick
    pub last_poll: Option<DateTime<Utc>>,
    /// Most recent tick whose extraction succeeded
    pub last_success: Option<DateTime<Utc>>,
    /// Most recent tick that published a new snapshot
    pub last_change: Option<DateTime<Utc>>,
    /// Error of the most recent tick, cleared on success
    pub last_error: Option<String>,
    pub poll_count: u64,
    pub error_count: u64,
    pub change_count: u64,
}

pub type SharedPollStatus = Arc<Mutex<PollStatus>>;

/// What a single tick did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new snapshot was stored and pushed to `delivered` subscribers
    Changed { entities: usize, delivered: usize },
    /// Extraction succeeded but nothing significant changed
    Unchanged,
    /// Extraction failed or timed out; the current snapshot is untouched
    Failed,
}

/// Drives the extractor on a fixed period
pub struct Poller {
    extractor: Arc<dyn Extractor>,
    store: Arc<SnapshotStore>,
    broadcaster: Arc<Broadcaster>,
    period: Duration,
    extract_timeout: Duration,
    match_by: MatchBy,
    status: SharedPollStatus,
}

impl Poller {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        store: Arc<SnapshotStore>,
        broadcaster: Arc<Broadcaster>,
        config: &PollerConfig,
        extract_timeout: Duration,
    ) -> Self {
        Self {
            extractor,
            store,
            broadcaster,
            period: config.interval(),
            extract_timeout,
            match_by: config.match_by,
            status: Arc::new(Mutex::new(PollStatus::default())),
        }
    }

    /// Returns a clone of the status tracker for external monitoring.
    pub fn status(&self) -> SharedPollStatus {
        Arc::clone(&self.status)
    }

    /// Starts the polling loop (non-blocking).
    ///
    /// The first tick runs immediately, then one every period. Missed ticks
    /// are skipped rather than bunched up after a slow extraction.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                extractor = %self.extractor.name(),
                interval_secs = self.period.as_secs(),
                timeout_secs = self.extract_timeout.as_secs(),
                match_by = ?self.match_by,
                "Starting poller"
            );

            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                self.tick().await;
            }
        })
    }

    /// Run one full extract → diff → store → broadcast pass
    pub async fn tick(&self) -> TickOutcome {
        let started = Utc::now();
        {
            let mut status = self.status.lock().await;
            status.last_poll = Some(started);
            status.poll_count += 1;
        }

        let fresh = match timeout(self.extract_timeout, self.extractor.extract()).await {
            Ok(Ok(fresh)) => fresh,
            Ok(Err(e)) => {
                let message = format!("{:#}", e);
                error!(extractor = %self.extractor.name(), error = %message, "Poll failed");
                self.record_failure(message).await;
                return TickOutcome::Failed;
            }
            Err(_) => {
                error!(
                    extractor = %self.extractor.name(),
                    timeout_secs = self.extract_timeout.as_secs(),
                    "Poll timed out"
                );
                self.record_failure(format!(
                    "extraction timed out after {}s",
                    self.extract_timeout.as_secs()
                ))
                .await;
                return TickOutcome::Failed;
            }
        };

        let current = self.store.current();
        let outcome = diff_with(&current, &fresh, Utc::now(), self.match_by);

        if !outcome.changed {
            debug!(entities = fresh.len(), "No change");
            self.record_success(false).await;
            return TickOutcome::Unchanged;
        }

        let entities = outcome.next.entity_count();
        let alerts = outcome.next.alert_count();
        let delivered = self.broadcaster.publish(&self.store, outcome.next);

        info!(
            entities = entities,
            alerts = alerts,
            subscribers = delivered,
            "Snapshot changed"
        );

        self.record_success(true).await;
        TickOutcome::Changed {
            entities,
            delivered,
        }
    }

    async fn record_failure(&self, message: String) {
        let mut status = self.status.lock().await;
        status.last_error = Some(message);
        status.error_count += 1;
    }

    async fn record_success(&self, changed: bool) {
        let now = Utc::now();
        let mut status = self.status.lock().await;
        status.last_success = Some(now);
        status.last_error = None;
        if changed {
            status.last_change = Some(now);
            status.change_count += 1;
        }
    }
}
