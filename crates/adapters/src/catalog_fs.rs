//! JSON catalog file written by the deals crawler

use async_trait::async_trait;
use coupon_herald_domain::{CatalogError, CatalogItem, CatalogSource};
use std::path::{Path, PathBuf};

/// Reads the whole catalog snapshot from a JSON array file
pub struct JsonCatalogSource {
    path: PathBuf,
}

impl JsonCatalogSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn parse(&self, content: &str) -> Result<Vec<CatalogItem>, CatalogError> {
        if content.trim().is_empty() {
            return Ok(vec![]);
        }

        serde_json::from_str(content).map_err(|e| CatalogError::Parse {
            file: self.path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl CatalogSource for JsonCatalogSource {
    async fn load_catalog(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    path = %self.path.display(),
                    "Catalog file not found, treating as empty"
                );
                return Ok(vec![]);
            }
            Err(e) => return Err(CatalogError::Io(e)),
        };

        let items = self.parse(&content)?;
        tracing::debug!(path = %self.path.display(), count = items.len(), "Loaded catalog");
        Ok(items)
    }
}
