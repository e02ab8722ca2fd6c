//! Outbox delivery: append announcements to a JSONL file instead of posting.

use async_trait::async_trait;
use coupon_herald_domain::{ActionLink, DeliveryError, DeliveryPort, DeliveryReceipt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct OutboxWriter {
    path: PathBuf,
    file: Arc<Mutex<tokio::fs::File>>,
}

impl OutboxWriter {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, OutboxError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, entry: &OutboxEntry<'_>) -> Result<(), OutboxError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Delivery adapter that records announcements for later review.
///
/// A successful append counts as a confirmed delivery, so the cursor advances.
#[derive(Debug, Clone)]
pub struct OutboxDelivery {
    writer: OutboxWriter,
}

impl OutboxDelivery {
    pub fn new(writer: OutboxWriter) -> Self {
        Self { writer }
    }

    async fn record(
        &self,
        variant: &'static str,
        destination: &str,
        media: Option<&str>,
        text: &str,
        action: Option<&ActionLink>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let id = Uuid::new_v4().to_string();
        let queued_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| DeliveryError::Api(format!("Outbox write failed: {}", e)))?;

        let entry = OutboxEntry {
            id: &id,
            variant,
            destination,
            media,
            text,
            action_label: action.map(|a| a.label.as_str()),
            action_url: action.map(|a| a.url.as_str()),
            queued_at: &queued_at,
        };

        self.writer
            .append(&entry)
            .await
            .map_err(|e| DeliveryError::Api(format!("Outbox write failed: {}", e)))?;

        tracing::debug!(path = %self.writer.path().display(), id = %id, "Queued announcement");

        Ok(DeliveryReceipt {
            message_id: id,
            url: None,
        })
    }
}

#[derive(Serialize)]
struct OutboxEntry<'a> {
    id: &'a str,
    variant: &'a str,
    destination: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<&'a str>,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    action_label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    action_url: Option<&'a str>,
    queued_at: &'a str,
}

#[async_trait]
impl DeliveryPort for OutboxDelivery {
    async fn send_media(
        &self,
        destination: &str,
        media: &str,
        caption: &str,
        action: Option<&ActionLink>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        self.record("media", destination, Some(media), caption, action)
            .await
    }

    async fn send_text(
        &self,
        destination: &str,
        text: &str,
        action: Option<&ActionLink>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        self.record("text", destination, None, text, action).await
    }

    fn name(&self) -> &'static str {
        "outbox"
    }
}
