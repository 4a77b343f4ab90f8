use serde::Deserialize;

use super::IngestError;

/// Raw manifest as found in `plugin.json`. Everything optional so that
/// missing required fields can be reported individually.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawManifest {
    id: Option<String>,
    version: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    icon: Option<String>,
    author: Option<String>,
    min_app_version: Option<String>,
    title: Option<String>,
    category: Option<String>,
    synopsis: Option<String>,
    description: Option<String>,
    homepage: Option<String>,
    comment: Option<String>,
}

/// Validated plugin manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub id: String,
    pub version: String,
    pub kind: String,
    pub icon: Option<String>,
    pub author: String,
    pub min_app_version: String,
    pub title: String,
    pub category: String,
    pub synopsis: String,
    pub description: String,
    pub homepage: String,
    pub comment: String,
}

pub fn parse(data: &[u8]) -> Result<Manifest, IngestError> {
    let raw: RawManifest = serde_json::from_slice(data)
        .map_err(|e| IngestError::ManifestDecode(e.to_string()))?;

    Ok(Manifest {
        id: raw.id.ok_or(IngestError::MissingField("id"))?,
        version: raw.version.ok_or(IngestError::MissingField("version"))?,
        kind: raw.kind.ok_or(IngestError::MissingField("type"))?,
        icon: raw.icon,
        author: raw.author.unwrap_or_default(),
        min_app_version: raw.min_app_version.unwrap_or_default(),
        title: raw.title.unwrap_or_default(),
        category: raw.category.unwrap_or_default(),
        synopsis: raw.synopsis.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
        homepage: raw.homepage.unwrap_or_default(),
        comment: raw.comment.unwrap_or_default(),
    })
}
