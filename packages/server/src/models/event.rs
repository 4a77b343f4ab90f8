use serde::Serialize;

use crate::entity::event;

/// One audit log entry.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EventResponse {
    /// Event time as a unix timestamp.
    pub created: i64,
    /// The user who performed the action.
    pub userid: i32,
    pub pluginid: String,
    /// Human-readable description of the action.
    #[schema(example = "Ingested version '1.2.3' status: Pending")]
    pub info: String,
}

impl From<event::Model> for EventResponse {
    fn from(model: event::Model) -> Self {
        Self {
            created: model.created_at.timestamp(),
            userid: model.user_id,
            pluginid: model.plugin_id,
            info: model.info,
        }
    }
}
