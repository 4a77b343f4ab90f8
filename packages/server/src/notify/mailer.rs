use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

/// Outbound mail delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> io::Result<()>;
}

/// Delivers by piping a composed message into the local `sendmail` binary.
pub struct SendmailMailer {
    /// Sender address. `None` disables delivery entirely.
    sender: Option<String>,
}

impl SendmailMailer {
    pub fn new(sender: Option<String>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl Mailer for SendmailMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> io::Result<()> {
        let Some(sender) = &self.sender else {
            debug!("No sender configured, dropping mail to '{recipient}'");
            return Ok(());
        };

        // The recipient becomes a sendmail argument. Refuse anything that
        // could be parsed as an option or split into multiple arguments.
        if recipient.starts_with('-') || recipient.contains(char::is_whitespace) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsafe recipient address '{recipient}'"),
            ));
        }

        let mut child = Command::new("sendmail")
            .arg(recipient)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let message = format!(
            "Subject: {subject}\nFrom: {sender}\nTo: {recipient}\n\n{body}"
        );
        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(message.as_bytes()).await?;
        }
        drop(child.stdin.take());

        let status = child.wait().await?;
        if !status.success() {
            return Err(io::Error::other(format!(
                "sendmail exited with {status}"
            )));
        }

        info!("Sent '{subject}' to '{recipient}'");
        Ok(())
    }
}
