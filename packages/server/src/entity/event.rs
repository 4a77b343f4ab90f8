use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only audit record. One row per mutating action.
///
/// The row's lifecycle is independent from its async notification: the row
/// persists even when delivery is lost.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub created_at: DateTimeUtc,

    /// The user who performed the action.
    pub user_id: i32,
    pub plugin_id: String,
    pub info: String,
}

impl ActiveModelBehavior for ActiveModel {}
