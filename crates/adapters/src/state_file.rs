//! Plain-text cursor file, one scalar per file

use async_trait::async_trait;
use coupon_herald_domain::{Cursor, CursorScheme, CursorStore, StateError};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Cursor store backed by a single text file
pub struct FileCursorStore {
    path: PathBuf,
    scheme: CursorScheme,
}

impl FileCursorStore {
    pub fn new(path: impl AsRef<Path>, scheme: CursorScheme) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            scheme,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CursorStore for FileCursorStore {
    fn scheme(&self) -> CursorScheme {
        self.scheme
    }

    async fn load_cursor(&self) -> Result<Cursor, StateError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(self.scheme.zero());
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Cursor file is not valid UTF-8, starting from the beginning"
                );
                return Ok(self.scheme.zero());
            }
            Err(e) => return Err(StateError::Io(e)),
        };

        match self.scheme.parse(&raw) {
            Some(cursor) => Ok(cursor),
            None => {
                tracing::warn!(
                    path = %self.path.display(),
                    content = %raw.trim(),
                    "Corrupt cursor file, starting from the beginning"
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

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write-then-rename so a crash never leaves a half-written cursor
        let temp = self.temp_path();
        fs::write(&temp, cursor.to_record()).await?;
        fs::rename(&temp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), cursor = %cursor, "Saved cursor");
        Ok(())
    }
}
