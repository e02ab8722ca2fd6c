//! SQLite cursor store implementation

use async_trait::async_trait;
use coupon_herald_domain::{Cursor, CursorScheme, CursorStore, StateError};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use time::OffsetDateTime;

/// SQLite-backed cursor store, one row per destination
pub struct SqliteCursorStore {
    pool: SqlitePool,
    destination: String,
    scheme: CursorScheme,
}

impl SqliteCursorStore {
    /// Create a new SQLite cursor store, initializing the database if needed
    pub async fn new(
        db_path: impl AsRef<Path>,
        destination: impl Into<String>,
        scheme: CursorScheme,
    ) -> Result<Self, StateError> {
        let db_path = db_path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&db_url)
            .await
            .map_err(|e| StateError::Database(e.to_string()))?;

        let store = Self {
            pool,
            destination: destination.into(),
            scheme,
        };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory(
        destination: impl Into<String>,
        scheme: CursorScheme,
    ) -> Result<Self, StateError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StateError::Database(e.to_string()))?;

        let store = Self {
            pool,
            destination: destination.into(),
            scheme,
        };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StateError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS dispatch_cursor (
                destination TEXT PRIMARY KEY,
                position INTEGER,
                last_identity TEXT,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StateError::Database(e.to_string()))?;

        Ok(())
    }

    fn decode(&self, position: Option<i64>, last_identity: Option<String>) -> Option<Cursor> {
        match self.scheme {
            CursorScheme::Position => position
                .and_then(|p| usize::try_from(p).ok())
                .map(Cursor::Position),
            CursorScheme::HeadWatch => Some(Cursor::LastSent(
                last_identity.filter(|id| !id.trim().is_empty()),
            )),
        }
    }
}

#[async_trait]
impl CursorStore for SqliteCursorStore {
    fn scheme(&self) -> CursorScheme {
        self.scheme
    }

    async fn load_cursor(&self) -> Result<Cursor, StateError> {
        let row: Option<(Option<i64>, Option<String>)> = sqlx::query_as(
            "SELECT position, last_identity FROM dispatch_cursor WHERE destination = ?",
        )
        .bind(&self.destination)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StateError::Database(e.to_string()))?;

        let Some((position, last_identity)) = row else {
            return Ok(self.scheme.zero());
        };

        match self.decode(position, last_identity) {
            Some(cursor) => Ok(cursor),
            None => {
                tracing::warn!(
                    destination = %self.destination,
                    position = ?position,
                    "Corrupt cursor row, starting from the beginning"
                );
                Ok(self.scheme.zero())
            }
        }
    }

    async fn save_cursor(&self, cursor: &Cursor) -> Result<(), StateError> {
        if cursor.scheme() != self.scheme {
            return Err(StateError::SchemeMismatch {
                expected: self.scheme,
                actual: cursor.scheme(),
            });
        }

        let current = self.load_cursor().await?;
        if cursor.regresses_from(&current) {
            return Err(StateError::Regression {
                from: current.to_string(),
                to: cursor.to_string(),
            });
        }

        let updated_at = OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(|e| StateError::Database(e.to_string()))?;

        let (position, last_identity) = match cursor {
            Cursor::Position(n) => (
                Some(i64::try_from(*n).map_err(|e| StateError::Database(e.to_string()))?),
                None,
            ),
            Cursor::LastSent(id) => (None, id.clone()),
        };

        sqlx::query(
            r#"
            INSERT INTO dispatch_cursor (destination, position, last_identity, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(destination) DO UPDATE SET
                position = excluded.position,
                last_identity = excluded.last_identity,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.destination)
        .bind(position)
        .bind(last_identity)
        .bind(&updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StateError::Database(e.to_string()))?;

        Ok(())
    }
}
