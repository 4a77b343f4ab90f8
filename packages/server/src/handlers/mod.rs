pub mod blob;
pub mod event;
pub mod feed;
pub mod ingest;
pub mod plugin;
pub mod version;

use serde::Deserialize;

use crate::error::AppError;

/// Actor identity for mutating endpoints.
///
/// Authentication happens upstream; the routing layer forwards the
/// already-verified identity as plain query arguments.
#[derive(Debug, Clone, Copy, Deserialize, utoipa::IntoParams)]
pub struct ActorQuery {
    /// Numeric id of the acting user. Required, must be non-zero.
    #[serde(default)]
    pub userid: i32,
    /// Non-zero grants administrative override.
    #[serde(default)]
    pub admin: i32,
}

impl ActorQuery {
    pub fn require_user(&self) -> Result<i32, AppError> {
        if self.userid == 0 {
            return Err(AppError::Validation(
                "'userid' request argument is required".into(),
            ));
        }
        Ok(self.userid)
    }

    pub fn is_admin(&self) -> bool {
        self.admin != 0
    }
}
