use serde::{Deserialize, Serialize};

use crate::entity::{plugin, version};
use crate::entity::version::VersionStatus;

/// Administrative view of a plugin record.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PluginResponse {
    /// Unique identifier for the plugin.
    #[schema(example = "navigator")]
    pub id: String,
    /// Numeric id of the owning user.
    #[schema(example = 42)]
    pub userid: i32,
    /// Shared secret granting beta access. Empty disables beta access.
    pub betasecret: String,
    /// Origin URL recorded at first ingestion.
    pub downloadurl: String,
    /// Creation time as a unix timestamp.
    #[schema(example = 1_600_000_000)]
    pub created: i64,
}

impl From<plugin::Model> for PluginResponse {
    fn from(model: plugin::Model) -> Self {
        Self {
            id: model.id,
            userid: model.user_id,
            betasecret: model.beta_secret,
            downloadurl: model.download_url,
            created: model.created_at.timestamp(),
        }
    }
}

/// Fields updatable on a plugin record.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct PluginUpdateRequest {
    #[serde(default)]
    pub betasecret: Option<String>,
    #[serde(default)]
    pub downloadurl: Option<String>,
}

/// One row of a plugin listing: the plugin joined with its most recently
/// ingested matching version.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PluginSummary {
    #[schema(example = "navigator")]
    pub id: String,
    #[schema(example = 42)]
    pub userid: i32,
    /// Latest version string.
    #[schema(example = "1.2.3")]
    pub version: String,
    /// Ingestion time of that version as a unix timestamp.
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
    /// Content digest of the icon blob, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub downloads: i32,
    pub published: bool,
    pub comment: String,
    pub status: VersionStatus,
}

impl PluginSummary {
    pub fn from_pair(plugin: &plugin::Model, version: version::Model) -> Self {
        Self {
            id: plugin.id.clone(),
            userid: plugin.user_id,
            version: version.version,
            created: version.created_at.timestamp(),
            kind: version.kind,
            author: version.author,
            min_app_version: version.min_app_version,
            title: version.title,
            category: version.category,
            synopsis: version.synopsis,
            description: version.description,
            homepage: version.homepage,
            icon: version.icon_digest,
            downloads: version.downloads,
            published: version.published,
            comment: version.comment,
            status: version.status,
        }
    }
}
