//! Change notification pipeline.
//!
//! Every mutating action records an event row on the caller's transaction
//! and enqueues a [`ChangeEvent`] onto an unbounded in-process channel. A
//! single consumer task drains the channel, resolves the involved users
//! against the external directory and mails the administrator and the
//! plugin owner. Delivery is best effort; the event row is the durable
//! record.

pub mod directory;
pub mod mailer;

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait};
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::config::EmailConfig;
use crate::entity::{event, plugin};
use directory::UserDirectory;
use mailer::Mailer;

#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub actor_user_id: i32,
    pub plugin_id: String,
    pub info: String,
}

/// Producer half of the notification pipeline. Cheap to clone.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<ChangeEvent>,
}

impl Notifier {
    /// Insert an event row on `conn` (typically an open transaction) and
    /// enqueue its notification.
    ///
    /// The enqueue is fire-and-forget: if the caller's transaction later
    /// rolls back, a spurious mail may go out, but no event row survives.
    pub async fn record<C: ConnectionTrait>(
        &self,
        conn: &C,
        actor_user_id: i32,
        plugin_id: &str,
        info: impl Into<String>,
    ) -> Result<(), DbErr> {
        let info = info.into();

        event::ActiveModel {
            created_at: Set(Utc::now()),
            user_id: Set(actor_user_id),
            plugin_id: Set(plugin_id.to_string()),
            info: Set(info.clone()),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        // A closed channel means shutdown is in progress.
        let _ = self.tx.send(ChangeEvent {
            actor_user_id,
            plugin_id: plugin_id.to_string(),
            info,
        });

        Ok(())
    }
}

/// Create a connected producer/consumer pair.
pub fn channel() -> (Notifier, mpsc::UnboundedReceiver<ChangeEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier { tx }, rx)
}

/// Drain the notification channel until all producers are gone.
pub async fn run_consumer(
    db: DatabaseConnection,
    config: EmailConfig,
    mailer: Arc<dyn Mailer>,
    directory: Arc<dyn UserDirectory>,
    mut rx: mpsc::UnboundedReceiver<ChangeEvent>,
) {
    info!("Starting change notification consumer");
    while let Some(change) = rx.recv().await {
        deliver(&db, &config, mailer.as_ref(), directory.as_ref(), change).await;
    }
    info!("Change notification consumer stopped");
}

#[instrument(skip_all, fields(plugin_id = %change.plugin_id))]
async fn deliver(
    db: &DatabaseConnection,
    config: &EmailConfig,
    mailer: &dyn Mailer,
    directory: &dyn UserDirectory,
    change: ChangeEvent,
) {
    let actor = directory.resolve(change.actor_user_id).await;

    let subject = format!(
        "{} {} {}",
        config.subject_prefix, change.plugin_id, change.info
    );

    let mut body = format!(
        "Change made by: {} <{}>\n",
        actor.name,
        actor.email.as_deref().unwrap_or("unknown")
    );
    if let Some(prefix) = &config.link_prefix {
        body.push_str(&format!("\nPlugin page: {prefix}{}\n", change.plugin_id));
    }
    body.push_str("\n-- \nAutomated mail from the plugin registry\n");

    if let Some(admin) = &config.admin {
        if let Err(e) = mailer.send(admin, &subject, &body).await {
            warn!("Failed to notify admin '{admin}': {e}");
        }
    }

    let owner = match plugin::Entity::find_by_id(&change.plugin_id).one(db).await {
        Ok(Some(p)) => Some(p.user_id),
        Ok(None) => None,
        Err(e) => {
            warn!("Owner lookup failed: {e}");
            None
        }
    };

    // Actors see their own changes; only mail the owner when someone else
    // touched their plugin.
    if let Some(owner_id) = owner.filter(|id| *id != change.actor_user_id) {
        let identity = directory.resolve(owner_id).await;
        match identity.email {
            Some(email) => {
                if let Err(e) = mailer.send(&email, &subject, &body).await {
                    warn!("Failed to notify owner '{email}': {e}");
                }
            }
            None => warn!("No email address for owner user {owner_id}"),
        }
    }

    info!(info = %change.info, "Notification processed");
}
