//! Router configuration for the HTTP API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route(
            "/timelines",
            get(handlers::list_timelines).post(handlers::create_timeline),
        )
        .route("/timelines/{timeline_id}", get(handlers::get_timeline))
        .route(
            "/timelines/{timeline_id}/anchor",
            get(handlers::get_anchor).put(handlers::update_anchor),
        )
        .route("/timelines/{timeline_id}/recalculate", post(handlers::recalculate))
        .route(
            "/timelines/{timeline_id}/recalculate/preview",
            post(handlers::preview_recalculation),
        )
        .route("/timelines/{timeline_id}/runs", get(handlers::list_runs));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        // Imports carry whole checklists
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
