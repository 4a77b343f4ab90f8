use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory of the content-addressed blob store.
    pub root: PathBuf,
    /// Maximum accepted blob size in bytes.
    pub max_blob_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Base URL rendered into package/icon download URLs,
    /// e.g. `https://plugins.example.com/public`.
    pub base_url: String,
    /// Admin password bypassing all feed access control when supplied
    /// as the `betapassword` request argument.
    #[serde(default)]
    pub beta_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EmailConfig {
    /// Sender address. Unset disables outbound mail entirely.
    #[serde(default)]
    pub sender: Option<String>,
    /// Administrative address notified of every change.
    #[serde(default)]
    pub admin: Option<String>,
    /// URL prefix for the plugin link included in notification bodies.
    #[serde(default)]
    pub link_prefix: Option<String>,
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

fn default_subject_prefix() -> String {
    "Registry".into()
}

/// External user directory used to resolve actor/owner identities for
/// notifications. Both fields unset degrades to placeholder identities.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub feed: FeedConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 9000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("storage.root", "./stash")?
            .set_default("storage.max_blob_size", 128 * 1024 * 1024)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., REGISTRY__DATABASE__URL)
            .add_source(Environment::with_prefix("REGISTRY").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
