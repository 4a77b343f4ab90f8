use std::sync::Arc;

use common::storage::filesystem::FilesystemBlobStore;
use tracing::{Level, info};

use server::config::AppConfig;
use server::notify::directory::HttpUserDirectory;
use server::notify::mailer::SendmailMailer;
use server::state::AppState;
use server::{database, notify};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = database::init_db(&config.database.url).await?;

    let blob_store = Arc::new(
        FilesystemBlobStore::new(config.storage.root.clone(), config.storage.max_blob_size)
            .await?,
    );

    let (notifier, rx) = notify::channel();
    let mailer = Arc::new(SendmailMailer::new(config.email.sender.clone()));
    let directory = Arc::new(HttpUserDirectory::new(config.directory.clone()));
    tokio::spawn(notify::run_consumer(
        db.clone(),
        config.email.clone(),
        mailer,
        directory,
        rx,
    ));

    let state = AppState {
        db,
        blob_store,
        notifier,
        http: reqwest::Client::new(),
        config: config.clone(),
    };

    let app = server::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
