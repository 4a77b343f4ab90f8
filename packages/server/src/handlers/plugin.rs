use std::collections::{HashMap, HashSet};

use axum::Json;
use axum::extract::{Path, Query, State};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, EntityTrait, QueryOrder,
    TransactionTrait,
};
use serde::Deserialize;
use tracing::instrument;

use super::ActorQuery;
use crate::entity::version::VersionStatus;
use crate::entity::{plugin, version};
use crate::error::{AppError, ErrorBody};
use crate::models::plugin::{PluginResponse, PluginSummary, PluginUpdateRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    /// Number of rows to skip.
    #[serde(default)]
    pub offset: usize,
    /// Maximum number of rows to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Restrict to plugins owned by this user, regardless of status.
    pub userid: Option<i32>,
    /// Non-zero lists every plugin regardless of status, ordered by id.
    #[serde(default)]
    pub admin: i32,
}

fn default_limit() -> usize {
    10
}

/// Build the listing every plugin endpoint shares: one row per plugin,
/// carrying its most recently ingested version among those the requested
/// view may see.
async fn collect_summaries<C: ConnectionTrait>(
    db: &C,
    query: &ListQuery,
) -> Result<Vec<PluginSummary>, AppError> {
    let plugins: HashMap<String, plugin::Model> = plugin::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

    let versions = version::Entity::find()
        .order_by_desc(version::Column::CreatedAt)
        .all(db)
        .await?;

    let admin = query.admin != 0;
    let mut seen: HashSet<String> = HashSet::new();
    let mut summaries = Vec::new();

    for v in versions {
        let Some(p) = plugins.get(&v.plugin_id) else {
            continue;
        };
        if let Some(userid) = query.userid
            && p.user_id != userid
        {
            continue;
        }
        // The public view only surfaces live versions; owners and admins
        // see their latest version whatever its state.
        if !admin
            && query.userid.is_none()
            && (v.status != VersionStatus::Approved || !v.published)
        {
            continue;
        }
        if !seen.insert(v.plugin_id.clone()) {
            continue;
        }
        summaries.push(PluginSummary::from_pair(p, v));
    }

    if admin || query.userid.is_some() {
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
    }

    Ok(summaries)
}

#[utoipa::path(
    get,
    path = "/plugins",
    tag = "Plugins",
    operation_id = "listPlugins",
    summary = "List plugins",
    description = "One row per plugin with its latest visible version. The default view \
        shows approved, published versions newest first; `userid` restricts to one \
        owner's plugins; `admin` shows everything ordered by id.",
    params(ListQuery),
    responses(
        (status = 200, description = "Plugin listing", body = [PluginSummary]),
    ),
)]
#[instrument(skip(state))]
pub async fn list_plugins(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PluginSummary>>, AppError> {
    let summaries = collect_summaries(&state.db, &query).await?;
    let page = summaries
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect();
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/plugins/count",
    tag = "Plugins",
    operation_id = "countPlugins",
    summary = "Count plugins",
    description = "Number of plugins matching the same filter as the listing.",
    params(ListQuery),
    responses(
        (status = 200, description = "Plugin count", content_type = "text/plain"),
    ),
)]
#[instrument(skip(state))]
pub async fn count_plugins(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<String, AppError> {
    let summaries = collect_summaries(&state.db, &query).await?;
    Ok(summaries.len().to_string())
}

pub(super) async fn find_plugin<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> Result<plugin::Model, AppError> {
    plugin::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plugin '{id}' not found")))
}

#[utoipa::path(
    get,
    path = "/plugins/{id}",
    tag = "Plugins",
    operation_id = "getPlugin",
    summary = "Fetch one plugin record",
    params(("id" = String, Path, description = "Plugin id")),
    responses(
        (status = 200, description = "Plugin record", body = PluginResponse),
        (status = 404, description = "Plugin not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_plugin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PluginResponse>, AppError> {
    let model = find_plugin(&state.db, &id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/plugins/{id}",
    tag = "Plugins",
    operation_id = "updatePlugin",
    summary = "Update plugin settings",
    description = "Updates the beta secret and/or download URL. Only the owner or an \
        administrator may update a plugin.",
    params(("id" = String, Path, description = "Plugin id"), ActorQuery),
    request_body = PluginUpdateRequest,
    responses(
        (status = 200, description = "Updated plugin record", body = PluginResponse),
        (status = 400, description = "Missing userid (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Plugin not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(userid = actor.userid))]
pub async fn update_plugin(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(actor): Query<ActorQuery>,
    Json(payload): Json<PluginUpdateRequest>,
) -> Result<Json<PluginResponse>, AppError> {
    let userid = actor.require_user()?;

    let txn = state.db.begin().await?;

    let existing = find_plugin(&txn, &id).await?;
    if existing.user_id != userid && !actor.is_admin() {
        return Err(AppError::PermissionDenied);
    }

    let mut active: plugin::ActiveModel = existing.into();
    if let Some(betasecret) = payload.betasecret {
        active.beta_secret = Set(betasecret);
    }
    if let Some(downloadurl) = payload.downloadurl {
        active.download_url = Set(downloadurl);
    }
    let updated = active.update(&txn).await?;

    state
        .notifier
        .record(&txn, userid, &id, "Plugin settings updated")
        .await?;

    txn.commit().await?;

    Ok(Json(updated.into()))
}
