//! On-disk photo storage

use inventory_common::Result;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Name of the photo directory inside the data directory
pub const PHOTOS_DIR: &str = "photos";

/// Directory of uploaded photo files, referenced by filename from item records
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    /// Create a store rooted at `<data_dir>/photos`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: data_dir.as_ref().join(PHOTOS_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the photo directory if missing
    pub async fn init(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Store `bytes` under a generated name that keeps the upload's extension
    pub async fn save(&self, bytes: &[u8], original_filename: Option<&str>) -> Result<String> {
        let filename = format!("{}{}", Uuid::new_v4(), extension_of(original_filename));

        tokio::fs::write(self.dir.join(&filename), bytes).await?;

        info!("Stored photo {} ({} bytes)", filename, bytes.len());
        Ok(filename)
    }

    /// Remove a stored photo. A file that is already gone is not an error.
    pub async fn delete(&self, filename: &str) -> Result<()> {
        let Some(path) = self.resolve_path(filename) else {
            debug!("Ignoring delete of invalid photo name: {}", filename);
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted photo {}", filename);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Photo already absent: {}", filename);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Path of a stored photo, or `None` if `filename` is not a plain file name
    pub fn resolve_path(&self, filename: &str) -> Option<PathBuf> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name.to_str() == Some(filename) => {
                Some(self.dir.join(name))
            }
            _ => None,
        }
    }

    /// Whether a stored photo is present on disk
    pub async fn exists(&self, filename: &str) -> bool {
        match self.resolve_path(filename) {
            Some(path) => tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false),
            None => false,
        }
    }
}

/// `.ext` of the uploaded filename, or empty if it has none we can keep
fn extension_of(original_filename: Option<&str>) -> String {
    original_filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}
