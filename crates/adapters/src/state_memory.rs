//! In-memory cursor store for testing and previews

use async_trait::async_trait;
use coupon_herald_domain::{Cursor, CursorScheme, CursorStore, StateError};
use std::sync::RwLock;

/// In-memory cursor store implementation
pub struct InMemoryCursorStore {
    scheme: CursorScheme,
    cursor: RwLock<Cursor>,
}

impl InMemoryCursorStore {
    pub fn new(scheme: CursorScheme) -> Self {
        Self {
            scheme,
            cursor: RwLock::new(scheme.zero()),
        }
    }
}

impl Default for InMemoryCursorStore {
    fn default() -> Self {
        Self::new(CursorScheme::default())
    }
}

#[async_trait]
impl CursorStore for InMemoryCursorStore {
    fn scheme(&self) -> CursorScheme {
        self.scheme
    }

    async fn load_cursor(&self) -> Result<Cursor, StateError> {
        let cursor = self
            .cursor
            .read()
            .map_err(|e| StateError::Database(e.to_string()))?;
        Ok(cursor.clone())
    }

    async fn save_cursor(&self, cursor: &Cursor) -> Result<(), StateError> {
        if cursor.scheme() != self.scheme {
            return Err(StateError::SchemeMismatch {
                expected: self.scheme,
                actual: cursor.scheme(),
            });
        }

        let mut current = self
            .cursor
            .write()
            .map_err(|e| StateError::Database(e.to_string()))?;
        if cursor.regresses_from(&current) {
            return Err(StateError::Regression {
                from: current.to_string(),
                to: cursor.to_string(),
            });
        }
        *current = cursor.clone();
        Ok(())
    }
}
