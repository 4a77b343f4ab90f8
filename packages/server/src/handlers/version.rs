use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, EntityTrait, ModelTrait,
    QueryOrder, TransactionTrait,
};
use tracing::instrument;

use super::ActorQuery;
use super::plugin::find_plugin;
use crate::entity::version;
use crate::entity::version::VersionStatus;
use crate::error::{AppError, ErrorBody};
use crate::models::version::VersionResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/plugins/{id}/versions",
    tag = "Versions",
    operation_id = "listVersions",
    summary = "List all versions of a plugin",
    params(("id" = String, Path, description = "Plugin id")),
    responses(
        (status = 200, description = "Versions, newest first", body = [VersionResponse]),
        (status = 404, description = "Plugin not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<VersionResponse>>, AppError> {
    let plugin = find_plugin(&state.db, &id).await?;

    let versions = plugin
        .find_related(version::Entity)
        .order_by_desc(version::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(versions.into_iter().map(Into::into).collect()))
}

async fn find_version<C: ConnectionTrait>(
    db: &C,
    plugin_id: &str,
    version: &str,
) -> Result<version::Model, AppError> {
    version::Entity::find_by_id((plugin_id.to_string(), version.to_string()))
        .one(db)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Version '{version}' of '{plugin_id}' not found"))
        })
}

#[utoipa::path(
    get,
    path = "/plugins/{id}/versions/{version}",
    tag = "Versions",
    operation_id = "getVersion",
    summary = "Fetch one version",
    params(
        ("id" = String, Path, description = "Plugin id"),
        ("version" = String, Path, description = "Version string"),
    ),
    responses(
        (status = 200, description = "Version record", body = VersionResponse),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_version(
    State(state): State<AppState>,
    Path((id, version)): Path<(String, String)>,
) -> Result<Json<VersionResponse>, AppError> {
    let model = find_version(&state.db, &id, &version).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/plugins/{id}/versions/{version}",
    tag = "Versions",
    operation_id = "deleteVersion",
    summary = "Delete one version",
    description = "Removes the version record. The package blob stays in the store. \
        Only the owner or an administrator may delete.",
    params(
        ("id" = String, Path, description = "Plugin id"),
        ("version" = String, Path, description = "Version string"),
        ActorQuery,
    ),
    responses(
        (status = 204, description = "Version deleted"),
        (status = 400, description = "Missing userid (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(userid = actor.userid))]
pub async fn delete_version(
    State(state): State<AppState>,
    Path((id, version_str)): Path<(String, String)>,
    Query(actor): Query<ActorQuery>,
) -> Result<StatusCode, AppError> {
    let userid = actor.require_user()?;

    let txn = state.db.begin().await?;

    let plugin = find_plugin(&txn, &id).await?;
    if plugin.user_id != userid && !actor.is_admin() {
        return Err(AppError::PermissionDenied);
    }

    let model = find_version(&txn, &id, &version_str).await?;
    model.delete(&txn).await?;

    state
        .notifier
        .record(&txn, userid, &id, format!("Deleted version '{version_str}'"))
        .await?;

    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Lifecycle action applied to one version.
#[derive(Debug, Clone, Copy)]
enum Action {
    Publish,
    Unpublish,
    Approve,
    Reject,
    Pend,
}

impl Action {
    fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "publish" => Ok(Self::Publish),
            "unpublish" => Ok(Self::Unpublish),
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "pend" => Ok(Self::Pend),
            other => Err(AppError::Validation(format!("Unknown action '{other}'"))),
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Self::Publish => "Published",
            Self::Unpublish => "Unpublished",
            Self::Approve => "Approved",
            Self::Reject => "Rejected",
            Self::Pend => "Pended",
        }
    }
}

#[utoipa::path(
    post,
    path = "/plugins/{id}/versions/{version}/{action}",
    tag = "Versions",
    operation_id = "versionAction",
    summary = "Apply a lifecycle action to a version",
    description = "Action is one of `publish`, `unpublish`, `approve`, `reject`, `pend`. \
        The update and its audit event commit atomically.",
    params(
        ("id" = String, Path, description = "Plugin id"),
        ("version" = String, Path, description = "Version string"),
        ("action" = String, Path, description = "Lifecycle action"),
        ActorQuery,
    ),
    responses(
        (status = 200, description = "Updated version record", body = VersionResponse),
        (status = 400, description = "Unknown action or missing userid (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(userid = actor.userid))]
pub async fn version_action(
    State(state): State<AppState>,
    Path((id, version_str, action)): Path<(String, String, String)>,
    Query(actor): Query<ActorQuery>,
) -> Result<Json<VersionResponse>, AppError> {
    let userid = actor.require_user()?;
    let action = Action::parse(&action)?;

    let txn = state.db.begin().await?;

    let model = find_version(&txn, &id, &version_str).await?;
    let mut active: version::ActiveModel = model.into();
    match action {
        Action::Publish => active.published = Set(true),
        Action::Unpublish => active.published = Set(false),
        Action::Approve => active.status = Set(VersionStatus::Approved),
        Action::Reject => active.status = Set(VersionStatus::Rejected),
        Action::Pend => active.status = Set(VersionStatus::Pending),
    }
    let updated = active.update(&txn).await?;

    state
        .notifier
        .record(
            &txn,
            userid,
            &id,
            format!("{} '{version_str}'", action.past_tense()),
        )
        .await?;

    txn.commit().await?;

    Ok(Json(updated.into()))
}
