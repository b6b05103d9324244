use crate::broadcast::Broadcaster;
use crate::poller::{PollStatus, SharedPollStatus};
use crate::snapshot::Snapshot;
use crate::state::SnapshotStore;
use axum::{extract::State, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Shared state for the read-only endpoints
pub struct QueryAppState {
    pub store: Arc<SnapshotStore>,
    pub broadcaster: Arc<Broadcaster>,
    pub poll_status: SharedPollStatus,
}

/// Service status response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub taken_at: DateTime<Utc>,
    pub entities: usize,
    pub alerts: usize,
    pub subscribers: usize,
    pub poll: PollStatus,
}

/// Create query API router
pub fn create_query_router(state: Arc<QueryAppState>) -> Router {
    Router::new()
        .route("/states", get(get_states))
        .route("/api/status", get(get_status))
        .with_state(state)
}

/// GET /states - Current snapshot
///
/// Before the first successful poll this is the empty initial snapshot.
async fn get_states(State(state): State<Arc<QueryAppState>>) -> Json<Arc<Snapshot>> {
    Json(state.store.current())
}

/// GET /api/status - Poll loop health and subscriber count
async fn get_status(State(state): State<Arc<QueryAppState>>) -> Json<StatusResponse> {
    let snapshot = state.store.current();
    let poll = state.poll_status.lock().await.clone();

    Json(StatusResponse {
        taken_at: snapshot.taken_at,
        entities: snapshot.entity_count(),
        alerts: snapshot.alert_count(),
        subscribers: state.broadcaster.subscriber_count(),
        poll,
    })
}
