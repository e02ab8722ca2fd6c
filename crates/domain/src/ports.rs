//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{ActionLink, CatalogItem, Cursor, CursorScheme, DeliveryReceipt};

/// Error type for catalog loading
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },
}

/// Port for reading the ordered catalog snapshot
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Load every item in discovery order. A missing catalog is an empty one.
    async fn load_catalog(&self) -> Result<Vec<CatalogItem>, CatalogError>;
}

/// Error type for cursor store operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Cursor scheme mismatch: store uses {expected:?}, got {actual:?}")]
    SchemeMismatch {
        expected: CursorScheme,
        actual: CursorScheme,
    },
    #[error("Refusing to move cursor backwards from {from} to {to}")]
    Regression { from: String, to: String },
}

/// Port for persisting dispatch progress
///
/// Callers must not run two cycles against the same store concurrently;
/// stores do not lock.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Scheme this store persists
    fn scheme(&self) -> CursorScheme;

    /// Load the cursor. Absent or corrupt state yields the scheme's zero value.
    async fn load_cursor(&self) -> Result<Cursor, StateError>;

    /// Persist the cursor. Only called after a confirmed delivery.
    async fn save_cursor(&self, cursor: &Cursor) -> Result<(), StateError>;
}

/// Error type for delivery operations
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limited, retry after: {0:?}")]
    RateLimited(Option<std::time::Duration>),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unconfirmed delivery: {0}")]
    Unconfirmed(String),
}

/// Port for sending announcements to a destination channel
#[async_trait]
pub trait DeliveryPort: Send + Sync {
    /// Send a photo with the announcement as its caption
    async fn send_media(
        &self,
        destination: &str,
        media: &str,
        caption: &str,
        action: Option<&ActionLink>,
    ) -> Result<DeliveryReceipt, DeliveryError>;

    /// Send the announcement as a plain text message
    async fn send_text(
        &self,
        destination: &str,
        text: &str,
        action: Option<&ActionLink>,
    ) -> Result<DeliveryReceipt, DeliveryError>;

    /// Adapter name for logs (e.g., "telegram", "outbox")
    fn name(&self) -> &'static str;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
