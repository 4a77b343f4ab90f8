use axum::Json;
use axum::extract::{Query, State};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Deserialize;
use tracing::instrument;

use crate::entity::{event, plugin};
use crate::error::AppError;
use crate::models::event::EventResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct EventListQuery {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Restrict to events concerning this plugin.
    pub plugin: Option<String>,
    /// Restrict to events concerning plugins owned by this user.
    pub userid: Option<i32>,
}

fn default_limit() -> u64 {
    10
}

async fn filtered<C: ConnectionTrait>(
    db: &C,
    query: &EventListQuery,
) -> Result<sea_orm::Select<event::Entity>, AppError> {
    let mut select = event::Entity::find();

    if let Some(plugin_id) = &query.plugin {
        select = select.filter(event::Column::PluginId.eq(plugin_id));
    }
    if let Some(userid) = query.userid {
        let owned: Vec<String> = plugin::Entity::find()
            .filter(plugin::Column::UserId.eq(userid))
            .all(db)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        select = select.filter(event::Column::PluginId.is_in(owned));
    }

    Ok(select)
}

#[utoipa::path(
    get,
    path = "/events",
    tag = "Events",
    operation_id = "listEvents",
    summary = "List audit events",
    params(EventListQuery),
    responses(
        (status = 200, description = "Events, newest first", body = [EventResponse]),
    ),
)]
#[instrument(skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let events = filtered(&state.db, &query)
        .await?
        .order_by_desc(event::Column::CreatedAt)
        .offset(query.offset)
        .limit(query.limit)
        .all(&state.db)
        .await?;

    Ok(Json(events.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/events/count",
    tag = "Events",
    operation_id = "countEvents",
    summary = "Count audit events",
    params(EventListQuery),
    responses(
        (status = 200, description = "Event count", content_type = "text/plain"),
    ),
)]
#[instrument(skip(state))]
pub async fn count_events(
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<String, AppError> {
    let count = filtered(&state.db, &query)
        .await?
        .count(&state.db)
        .await?;

    Ok(count.to_string())
}
