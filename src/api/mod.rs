// HTTP surface: live stream, snapshot query, status

pub mod live;
pub mod query;

pub use live::{create_live_router, live_handler, LiveAppState, LiveMessage};
pub use query::{create_query_router, QueryAppState, StatusResponse};

use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};

/// Assemble the full application router
///
/// When `static_dir` exists it serves every path not matched by the API.
pub fn create_app(
    live: Arc<LiveAppState>,
    query: Arc<QueryAppState>,
    static_dir: Option<&Path>,
) -> Router {
    let router = Router::new()
        .merge(create_live_router(live))
        .merge(create_query_router(query));

    let router = match static_dir {
        Some(dir) if dir.is_dir() => {
            info!(directory = %dir.display(), "Serving static assets");
            router.fallback_service(ServeDir::new(dir))
        }
        Some(dir) => {
            warn!(directory = %dir.display(), "Static directory not found, assets disabled");
            router
        }
        None => router,
    };

    router.layer(CorsLayer::permissive())
}
