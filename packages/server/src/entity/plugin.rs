use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plugin")]
pub struct Model {
    /// Natural key chosen by the uploader at first ingestion.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owner. Immutable after creation except by administrative override.
    pub user_id: i32,

    /// Shared secret granting beta visibility into this plugin's
    /// unapproved or unpublished versions. Empty means no beta access.
    pub beta_secret: String,

    /// Origin URL recorded at first ingestion, if the archive came in by URL.
    pub download_url: String,

    pub created_at: DateTimeUtc,

    #[sea_orm(has_many)]
    pub versions: HasMany<super::version::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
