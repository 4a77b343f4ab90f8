//! Archive ingestion pipeline.
//!
//! Takes an uploaded zip archive (directly or fetched from a URL), validates
//! its manifest, persists the icon and the repackaged archive to the blob
//! store and records the new version inside a single database transaction.

mod archive;
mod manifest;

pub use archive::FileSet;
pub use manifest::Manifest;

use chrono::Utc;
use common::storage::{BlobStore, StorageError};
use sea_orm::prelude::DateTimeUtc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, DatabaseConnection, DbErr, EntityTrait,
    TransactionTrait,
};
use thiserror::Error;
use tracing::{info, instrument};

use crate::entity::{plugin, version};
use crate::entity::version::VersionStatus;
use crate::notify::Notifier;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unable to read archive: {0}")]
    Archive(String),

    #[error("plugin.json not found in archive root or a single shared sub-directory")]
    ManifestNotFound,

    #[error("'{path}' is not inside sub-directory '{root}'")]
    MixedRoots { path: String, root: String },

    #[error("unable to decode plugin.json: {0}")]
    ManifestDecode(String),

    #[error("'{0}' missing from plugin.json")]
    MissingField(&'static str),

    #[error("{id} {version} already ingested at {created}")]
    AlreadyIngested {
        id: String,
        version: String,
        created: DateTimeUtc,
    },

    #[error("plugin is owned by another user")]
    NotOwner,

    #[error("unsupported download protocol in '{0}'")]
    InvalidUrl(String),

    #[error("unable to download '{url}': {reason}")]
    Download { url: String, reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Human-readable transcript of an ingestion attempt, returned to the
/// uploader verbatim.
#[derive(Debug, Default)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    pub fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IngestFlags {
    /// Administrative override: may ingest into plugins owned by others.
    pub admin: bool,
    /// Mark the new version approved instead of pending. Only honored
    /// together with `admin`.
    pub auto_approve: bool,
}

#[derive(Debug)]
pub struct IngestOutcome {
    pub plugin_id: String,
    pub version: String,
    pub status: VersionStatus,
}

/// Fetch an archive over HTTP(S) and run it through [`ingest_archive`].
pub async fn ingest_from_url(
    db: &DatabaseConnection,
    store: &dyn BlobStore,
    notifier: &Notifier,
    client: &reqwest::Client,
    url: &str,
    acting_user_id: i32,
    flags: IngestFlags,
    report: &mut Report,
) -> Result<IngestOutcome, IngestError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(IngestError::InvalidUrl(url.to_string()));
    }

    report.line(format!("Downloading {url}"));
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| IngestError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    let data = response.bytes().await.map_err(|e| IngestError::Download {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    report.line(format!("Downloaded {} bytes", data.len()));

    ingest_archive(
        db,
        store,
        notifier,
        &data,
        acting_user_id,
        flags,
        Some(url),
        report,
    )
    .await
}

/// Run the full ingestion pipeline on an in-memory archive.
///
/// All database work happens inside one transaction; a failure at any step
/// rolls back every row written so far. Blobs already persisted by a failed
/// attempt stay in the store unreferenced, which is harmless: the store is
/// content addressed, so a retry converges on the same paths.
#[instrument(skip_all, fields(user_id = acting_user_id))]
#[allow(clippy::too_many_arguments)]
pub async fn ingest_archive(
    db: &DatabaseConnection,
    store: &dyn BlobStore,
    notifier: &Notifier,
    data: &[u8],
    acting_user_id: i32,
    flags: IngestFlags,
    origin_url: Option<&str>,
    report: &mut Report,
) -> Result<IngestOutcome, IngestError> {
    let mut files = FileSet::extract(data, report)?;
    let manifest_bytes = files.locate_manifest(report)?;
    let manifest = manifest::parse(&manifest_bytes)?;

    report.line(format!(
        "Ingesting plugin '{}' version '{}'",
        manifest.id, manifest.version
    ));

    let txn = db.begin().await?;

    // Dropped transactions roll back, so early returns below are safe.
    if let Some(existing) =
        version::Entity::find_by_id((manifest.id.clone(), manifest.version.clone()))
            .one(&txn)
            .await?
    {
        return Err(IngestError::AlreadyIngested {
            id: manifest.id,
            version: manifest.version,
            created: existing.created_at,
        });
    }

    match plugin::Entity::find_by_id(&manifest.id).one(&txn).await? {
        None => {
            plugin::ActiveModel {
                id: Set(manifest.id.clone()),
                user_id: Set(acting_user_id),
                beta_secret: Set(String::new()),
                download_url: Set(origin_url.unwrap_or_default().to_string()),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            report.line(format!("Created new plugin '{}'", manifest.id));
            notifier
                .record(&txn, acting_user_id, &manifest.id, "Plugin created")
                .await?;
        }
        Some(existing) if existing.user_id != acting_user_id && !flags.admin => {
            return Err(IngestError::NotOwner);
        }
        Some(_) => {}
    }

    let icon_digest = match &manifest.icon {
        Some(name) => match files.find(name) {
            Some(f) => {
                let digest = store.put(&f.data).await?;
                report.line(format!("Using '{name}' as icon"));
                Some(digest.to_hex())
            }
            None => {
                report.line(format!("WARNING: Icon '{name}' not found in archive"));
                None
            }
        },
        None => {
            report.line("NOTICE: No icon specified in plugin.json");
            None
        }
    };

    let package = files.repackage()?;
    let pkg_digest = store.put(&package).await?;
    report.line(format!(
        "Stored package ({} bytes) as {}",
        package.len(),
        pkg_digest
    ));

    let status = if flags.admin && flags.auto_approve {
        VersionStatus::Approved
    } else {
        VersionStatus::Pending
    };

    version::ActiveModel {
        plugin_id: Set(manifest.id.clone()),
        version: Set(manifest.version.clone()),
        created_at: Set(Utc::now()),
        kind: Set(manifest.kind),
        author: Set(manifest.author),
        min_app_version: Set(manifest.min_app_version),
        title: Set(manifest.title),
        category: Set(manifest.category),
        synopsis: Set(manifest.synopsis),
        description: Set(manifest.description),
        homepage: Set(manifest.homepage),
        comment: Set(manifest.comment),
        pkg_digest: Set(pkg_digest.to_hex()),
        icon_digest: Set(icon_digest),
        downloads: Set(0),
        published: Set(false),
        status: Set(status),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let status_word = match status {
        VersionStatus::Approved => "Auto-approved",
        _ => "Pending",
    };
    notifier
        .record(
            &txn,
            acting_user_id,
            &manifest.id,
            format!("Ingested version '{}' status: {status_word}", manifest.version),
        )
        .await?;

    txn.commit().await?;

    info!(
        plugin_id = %manifest.id,
        version = %manifest.version,
        "Ingested new version"
    );
    report.line(format!(
        "OK, ingested version '{}' status: {status_word}",
        manifest.version
    ));

    Ok(IngestOutcome {
        plugin_id: manifest.id,
        version: manifest.version,
        status,
    })
}
