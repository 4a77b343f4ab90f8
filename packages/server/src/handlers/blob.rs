use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use common::storage::Digest;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::entity::version;
use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/data/{digest}",
    tag = "Public",
    operation_id = "downloadBlob",
    summary = "Download a stored blob",
    description = "Streams a blob by its content digest. Responses are immutable and \
        cacheable forever; serving a package blob bumps the download counter of the \
        version(s) referencing it.",
    params(("digest" = String, Path, description = "40-char lowercase hex SHA-1 digest")),
    responses(
        (status = 200, description = "Blob content", content_type = "application/octet-stream"),
        (status = 404, description = "No such blob (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_blob(
    State(state): State<AppState>,
    Path(digest): Path<String>,
) -> Result<Response, AppError> {
    // Malformed digests (wrong length, dots, slashes) can never name a
    // stored blob, so they get the same answer a missing one does.
    let digest =
        Digest::from_hex(&digest).map_err(|_| AppError::NotFound("No such blob".into()))?;

    let size = state.blob_store.size(&digest).await?;
    let reader = state.blob_store.get_stream(&digest).await?;

    version::Entity::update_many()
        .col_expr(
            version::Column::Downloads,
            Expr::col(version::Column::Downloads).add(1),
        )
        .filter(version::Column::PkgDigest.eq(digest.to_hex()))
        .exec(&state.db)
        .await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(header::ETAG, format!("\"{digest}\""))
        .header(
            header::CACHE_CONTROL,
            "public, max-age=31536000, immutable",
        )
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}
