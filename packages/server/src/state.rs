use std::sync::Arc;

use common::storage::BlobStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::notify::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub blob_store: Arc<dyn BlobStore>,
    pub notifier: Notifier,
    /// Shared HTTP client for URL-based ingestion.
    pub http: reqwest::Client,
    pub config: AppConfig,
}
