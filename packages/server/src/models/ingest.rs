use serde::Serialize;

/// Outcome of an ingestion attempt.
///
/// Always returned with status 200; `error` signals whether the attempt
/// succeeded and `result` carries the full transcript either way.
#[derive(Serialize, utoipa::ToSchema)]
pub struct IngestResponse {
    /// True when ingestion failed.
    pub error: bool,
    /// Human-readable transcript of the attempt.
    pub result: String,
    /// Plugin id from the accepted manifest. Absent on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pluginid: Option<String>,
    /// Version string from the accepted manifest. Absent on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}
