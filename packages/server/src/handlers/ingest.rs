use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::{error, instrument};

use crate::error::{AppError, ErrorBody};
use crate::ingest::{self, IngestError, IngestFlags, Report};
use crate::models::ingest::IngestResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct IngestQuery {
    /// Numeric id of the uploading user. Required, must be non-zero.
    #[serde(default)]
    pub userid: i32,
    /// Non-zero grants administrative override (ingest into plugins owned
    /// by others, honor `autoapprove`).
    #[serde(default)]
    pub admin: i32,
    /// Non-zero marks the new version approved immediately. Admin only.
    #[serde(default)]
    pub autoapprove: i32,
    /// Fetch the archive from this URL instead of the request body.
    pub url: Option<String>,
}

#[utoipa::path(
    post,
    path = "/ingest",
    tag = "Ingestion",
    operation_id = "ingestArchive",
    summary = "Ingest a plugin archive",
    description = "Accepts a zip archive either as the raw request body or fetched from \
        the `url` query argument. Pipeline failures are reported in-band: the response \
        is always 200 with `error` set and the full transcript in `result`.",
    params(IngestQuery),
    request_body(content_type = "application/octet-stream", description = "Zip archive"),
    responses(
        (status = 200, description = "Ingestion outcome", body = IngestResponse),
        (status = 400, description = "Missing userid or archive (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, body), fields(userid = query.userid))]
pub async fn ingest(
    State(state): State<AppState>,
    Query(query): Query<IngestQuery>,
    body: Bytes,
) -> Result<Json<IngestResponse>, AppError> {
    if query.userid == 0 {
        return Err(AppError::Validation(
            "'userid' request argument is required".into(),
        ));
    }

    let flags = IngestFlags {
        admin: query.admin != 0,
        auto_approve: query.autoapprove != 0,
    };

    let mut report = Report::default();
    let outcome = match &query.url {
        Some(url) => {
            ingest::ingest_from_url(
                &state.db,
                &*state.blob_store,
                &state.notifier,
                &state.http,
                url,
                query.userid,
                flags,
                &mut report,
            )
            .await
        }
        None if !body.is_empty() => {
            ingest::ingest_archive(
                &state.db,
                &*state.blob_store,
                &state.notifier,
                &body,
                query.userid,
                flags,
                None,
                &mut report,
            )
            .await
        }
        None => {
            return Err(AppError::Validation(
                "No archive supplied: pass 'url' or an archive request body".into(),
            ));
        }
    };

    match outcome {
        Ok(outcome) => Ok(Json(IngestResponse {
            error: false,
            result: report.render(),
            pluginid: Some(outcome.plugin_id),
            version: Some(outcome.version),
        })),
        Err(e) => {
            // Infrastructure detail stays in the server log; the uploader
            // only learns that the backend failed.
            match &e {
                IngestError::Db(inner) => {
                    error!("Ingestion failed: {inner}");
                    report.line("ERROR: Database query problems");
                }
                IngestError::Storage(inner) => {
                    error!("Ingestion failed: {inner}");
                    report.line("ERROR: Storage problems");
                }
                _ => report.line(format!("ERROR: {e}")),
            }
            Ok(Json(IngestResponse {
                error: true,
                result: report.render(),
                pluginid: None,
                version: None,
            }))
        }
    }
}
