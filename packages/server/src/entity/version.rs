use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review status of an ingested version.
///
/// Stored as a single character, serialized the same way on the wire.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
    DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(1))")]
pub enum VersionStatus {
    /// Awaiting review. Hidden from the public feed.
    #[sea_orm(string_value = "p")]
    #[serde(rename = "p")]
    Pending,
    /// Reviewed and approved for the public feed.
    #[sea_orm(string_value = "a")]
    #[serde(rename = "a")]
    Approved,
    /// Rejected. Surfaced in the feed blacklist so clients avoid it.
    #[sea_orm(string_value = "r")]
    #[serde(rename = "r")]
    Rejected,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "version")]
pub struct Model {
    /// Composite key with `version`: ingestion of a duplicate pair is
    /// rejected, never overwritten.
    #[sea_orm(primary_key, auto_increment = false)]
    pub plugin_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub version: String,

    #[sea_orm(belongs_to, from = "plugin_id", to = "id")]
    pub plugin: HasOne<super::plugin::Entity>,

    pub created_at: DateTimeUtc,

    /// Manifest `type`.
    pub kind: String,
    pub author: String,
    /// Minimum client version string required to run this version.
    pub min_app_version: String,
    pub title: String,
    pub category: String,
    pub synopsis: String,
    pub description: String,
    pub homepage: String,
    pub comment: String,

    /// Digest of the repackaged (uncompressed) archive in the blob store.
    pub pkg_digest: String,
    /// Digest of the icon blob, when the manifest named one that existed.
    pub icon_digest: Option<String>,

    /// Monotonic counter, bumped when the package blob is served.
    pub downloads: i32,
    pub published: bool,
    pub status: VersionStatus,
}

impl ActiveModelBehavior for ActiveModel {}
