use crate::broadcast::Broadcaster;
use crate::snapshot::Snapshot;
use crate::state::SnapshotStore;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Shared state for the live stream
pub struct LiveAppState {
    pub store: Arc<SnapshotStore>,
    pub broadcaster: Arc<Broadcaster>,
    pub keep_alive: Duration,
}

/// Server → Client message on the live stream
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum LiveMessage {
    States(Arc<Snapshot>),
}

/// Create live stream router
pub fn create_live_router(state: Arc<LiveAppState>) -> Router {
    Router::new()
        .route("/live", get(live_handler))
        .with_state(state)
}

/// GET /live - SSE stream of snapshots
///
/// Sends the current snapshot first (if one was published), then every
/// changed snapshot. The subscription is released when the client goes away
/// and the response stream is dropped.
pub async fn live_handler(
    State(state): State<Arc<LiveAppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let subscription = state.broadcaster.subscribe(&state.store);
    debug!(
        subscriber = %subscription.id(),
        subscribers = state.broadcaster.subscriber_count(),
        "Live subscriber connected"
    );

    let stream = subscription.map(|snapshot| Event::default().json_data(LiveMessage::States(snapshot)));

    Sse::new(stream).keep_alive(KeepAlive::new().interval(state.keep_alive))
}
