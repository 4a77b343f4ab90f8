use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    routing::{get, post},
};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

/// Authenticated REST surface, nested under `/api`.
pub fn api_routes(config: &AppConfig) -> Router<AppState> {
    let ingest = Router::new()
        .route("/ingest", post(handlers::ingest::ingest))
        .layer(DefaultBodyLimit::max(
            usize::try_from(config.storage.max_blob_size).unwrap_or(usize::MAX),
        ));

    Router::new()
        .merge(ingest)
        .nest("/plugins", plugin_routes())
        .route("/events", get(handlers::event::list_events))
        .route("/events/count", get(handlers::event::count_events))
}

fn plugin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::plugin::list_plugins))
        .route("/count", get(handlers::plugin::count_plugins))
        .route(
            "/{id}",
            get(handlers::plugin::get_plugin).put(handlers::plugin::update_plugin),
        )
        .route("/{id}/versions", get(handlers::version::list_versions))
        .route(
            "/{id}/versions/{version}",
            get(handlers::version::get_version).delete(handlers::version::delete_version),
        )
        .route(
            "/{id}/versions/{version}/{action}",
            post(handlers::version::version_action),
        )
}

/// Anonymous client-facing surface, nested under `/public`.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/plugins-v1.json", get(handlers::feed::feed_v1))
        .route("/data/{digest}", get(handlers::blob::get_blob))
}
