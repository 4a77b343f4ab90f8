use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::config::DirectoryConfig;

/// Identity of a user as known by the external directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub name: String,
    pub email: Option<String>,
}

impl UserIdentity {
    /// Fallback identity used whenever a lookup cannot complete.
    pub fn placeholder(user_id: i32) -> Self {
        Self {
            name: format!("User#{user_id}"),
            email: None,
        }
    }
}

/// Resolves numeric user ids to names and email addresses.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Never fails: lookup problems degrade to a placeholder identity.
    async fn resolve(&self, user_id: i32) -> UserIdentity;
}

#[derive(Debug, Deserialize)]
struct DirectoryUser {
    #[serde(default)]
    firstname: String,
    #[serde(default)]
    lastname: String,
    #[serde(default)]
    login: String,
    #[serde(default)]
    mail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectoryResponse {
    user: DirectoryUser,
}

/// Directory client talking to a JSON user API:
/// `GET {base_url}/users/{id}.json` authenticated by an `X-Api-Key` header.
pub struct HttpUserDirectory {
    client: reqwest::Client,
    config: DirectoryConfig,
}

impl HttpUserDirectory {
    pub fn new(config: DirectoryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn lookup(&self, user_id: i32) -> Option<UserIdentity> {
        let base = self.config.base_url.as_deref()?;
        let key = self.config.api_key.as_deref()?;

        let url = format!("{}/users/{user_id}.json", base.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", key)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| warn!("Directory lookup for user {user_id} failed: {e}"))
            .ok()?;

        let parsed: DirectoryResponse = response
            .json()
            .await
            .map_err(|e| warn!("Directory response for user {user_id} malformed: {e}"))
            .ok()?;

        let full = format!("{} {}", parsed.user.firstname, parsed.user.lastname);
        let name = if full.trim().is_empty() {
            parsed.user.login
        } else {
            full.trim().to_string()
        };

        Some(UserIdentity {
            name,
            email: parsed.user.mail,
        })
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn resolve(&self, user_id: i32) -> UserIdentity {
        match self.lookup(user_id).await {
            Some(identity) => identity,
            None => UserIdentity::placeholder(user_id),
        }
    }
}
