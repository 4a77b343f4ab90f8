pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod feed;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod notify;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Plugin Registry API",
        version = "1.0.0",
        description = "Registry for plugin archives: ingestion, review, \
            client feed and content-addressed blob delivery"
    ),
    tags(
        (name = "Plugins", description = "Plugin records and listings"),
        (name = "Versions", description = "Version records and lifecycle actions"),
        (name = "Ingestion", description = "Archive ingestion"),
        (name = "Events", description = "Audit log"),
        (name = "Public", description = "Anonymous client-facing endpoints"),
    ),
    paths(
        handlers::plugin::list_plugins,
        handlers::plugin::count_plugins,
        handlers::plugin::get_plugin,
        handlers::plugin::update_plugin,
        handlers::version::list_versions,
        handlers::version::get_version,
        handlers::version::delete_version,
        handlers::version::version_action,
        handlers::ingest::ingest,
        handlers::event::list_events,
        handlers::event::count_events,
        handlers::feed::feed_v1,
        handlers::blob::get_blob,
    ),
    components(schemas(
        error::ErrorBody,
        entity::version::VersionStatus,
        models::plugin::PluginResponse,
        models::plugin::PluginUpdateRequest,
        models::plugin::PluginSummary,
        models::version::VersionResponse,
        models::event::EventResponse,
        models::ingest::IngestResponse,
    )),
)]
struct ApiDoc;

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let layer = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(origins)
    };

    layer
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age))
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = cors_layer(&state.config.server.cors);

    axum::Router::new()
        .nest("/api", routes::api_routes(&state.config))
        .nest("/public", routes::public_routes())
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
}
