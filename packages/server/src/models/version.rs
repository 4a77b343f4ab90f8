use serde::Serialize;

use crate::entity::version;
use crate::entity::version::VersionStatus;

/// A single ingested version of a plugin.
#[derive(Serialize, utoipa::ToSchema)]
pub struct VersionResponse {
    #[schema(example = "1.2.3")]
    pub version: String,
    /// Ingestion time as a unix timestamp.
    pub created: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub author: String,
    #[serde(rename = "minAppVersion")]
    pub min_app_version: String,
    pub title: String,
    pub category: String,
    pub synopsis: String,
    pub description: String,
    pub homepage: String,
    pub comment: String,
    /// Content digest of the repackaged archive.
    #[schema(example = "a9993e364706816aba3e25717850c26c9cd0d89d")]
    pub pkg: String,
    /// Content digest of the icon blob, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub downloads: i32,
    pub published: bool,
    pub status: VersionStatus,
}

impl From<version::Model> for VersionResponse {
    fn from(model: version::Model) -> Self {
        Self {
            version: model.version,
            created: model.created_at.timestamp(),
            kind: model.kind,
            author: model.author,
            min_app_version: model.min_app_version,
            title: model.title,
            category: model.category,
            synopsis: model.synopsis,
            description: model.description,
            homepage: model.homepage,
            comment: model.comment,
            pkg: model.pkg_digest,
            icon: model.icon_digest,
            downloads: model.downloads,
            published: model.published,
            status: model.status,
        }
    }
}
