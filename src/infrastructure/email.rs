// Outbound email. Delivery itself is an external collaborator; the default
// sender only logs what would have been sent.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()>;
}

/// Logs every message at info level. Used when no mail transport is configured.
#[derive(Debug, Default, Clone)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        info!(to = %email.to, subject = %email.subject, "Email queued: {}", email.body);
        Ok(())
    }
}

/// Keeps sent messages in memory so tests can read verification links.
#[derive(Debug, Default, Clone)]
pub struct RecordingEmailSender {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email);
        }
        Ok(())
    }
}
