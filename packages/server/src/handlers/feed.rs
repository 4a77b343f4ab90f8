use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use sea_orm::EntityTrait;
use serde::Deserialize;
use tracing::instrument;

use crate::entity::{plugin, version};
use crate::error::AppError;
use crate::feed::{self, CatalogRow, FeedRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct FeedQuery {
    /// Client version override. When absent the version is taken from the
    /// trailing token of the User-Agent header.
    pub version: Option<String>,
    /// Beta password unlocking unapproved or unpublished versions of
    /// plugins whose beta secret it matches.
    pub betapassword: Option<String>,
}

#[utoipa::path(
    get,
    path = "/plugins-v1.json",
    tag = "Public",
    operation_id = "pluginFeed",
    summary = "Plugin feed",
    description = "The client-facing catalog: the best visible version of every plugin \
        for this particular client, plus a blacklist of rejected versions. Supports \
        ETag revalidation via If-None-Match.",
    params(FeedQuery),
    responses(
        (status = 200, description = "Feed document", content_type = "application/json"),
        (status = 304, description = "Not Modified (ETag match)"),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn feed_v1(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let secrets: HashMap<String, String> = plugin::Entity::find()
        .all(&state.db)
        .await?
        .into_iter()
        .map(|p| (p.id, p.beta_secret))
        .collect();

    let rows: Vec<CatalogRow> = version::Entity::find()
        .all(&state.db)
        .await?
        .into_iter()
        .map(|v| CatalogRow {
            beta_secret: secrets.get(&v.plugin_id).cloned().unwrap_or_default(),
            plugin_id: v.plugin_id,
            version: v.version,
            created_at: v.created_at,
            kind: v.kind,
            author: v.author,
            min_app_version: v.min_app_version,
            title: v.title,
            category: v.category,
            synopsis: v.synopsis,
            description: v.description,
            homepage: v.homepage,
            pkg_digest: v.pkg_digest,
            icon_digest: v.icon_digest,
            downloads: v.downloads,
            published: v.published,
            status: v.status,
        })
        .collect();

    let client_version = match &query.version {
        Some(v) => feed::client_version_from_arg(v),
        None => headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(feed::client_version_from_user_agent)
            .unwrap_or(u64::MAX),
    };

    let admin_bypass = match (&query.betapassword, &state.config.feed.beta_password) {
        (Some(given), Some(configured)) => given == configured,
        _ => false,
    };

    let request = FeedRequest {
        client_version,
        beta_password: query.betapassword,
        admin_bypass,
    };

    let document = feed::resolve_feed(rows, &request, &state.config.feed.base_url);
    let (json, etag) = feed::render(&document);
    let etag_value = format!("\"{etag}\"");

    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ETAG, etag_value)
        .body(json.into())
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}
