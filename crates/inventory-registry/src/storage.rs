//! Flat-file record storage for inventory items
//!
//! The whole inventory lives in a single pretty-printed JSON array. Every
//! operation loads the full document and every mutation rewrites it. Callers
//! must hold exclusive access (`&mut self`) for mutations; `AppState` keeps the
//! store behind a single mutex so read-modify-write cycles never interleave.

use inventory_common::{Error, Item, ItemPatch, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Name of the record document inside the data directory
pub const INVENTORY_FILE: &str = "inventory.json";

/// Storage backend for inventory records
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Create a store backed by `<data_dir>/inventory.json`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(INVENTORY_FILE),
        }
    }

    /// Path of the backing JSON document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the data directory and an empty document if missing
    pub async fn init(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        if !tokio::fs::try_exists(&self.path).await? {
            self.save(&[]).await?;
            info!("Created empty inventory at {}", self.path.display());
        }

        Ok(())
    }

    /// Load every record in stored order
    pub async fn load(&self) -> Result<Vec<Item>> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let items: Vec<Item> = serde_json::from_slice(&data)?;
        debug!("Loaded {} items from {}", items.len(), self.path.display());
        Ok(items)
    }

    /// Replace the stored document with `items`
    pub async fn save(&self, items: &[Item]) -> Result<()> {
        let json = serde_json::to_vec_pretty(items)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, &json))
            .await
            .map_err(|e| Error::Other(e.into()))??;

        debug!("Saved {} items to {}", items.len(), self.path.display());
        Ok(())
    }

    /// Append a new record
    pub async fn insert(&mut self, item: Item) -> Result<Item> {
        let mut items = self.load().await?;
        items.push(item.clone());
        self.save(&items).await?;

        info!("Registered item: {}", item.id);
        Ok(item)
    }

    /// Look up a record by id
    pub async fn get(&self, id: &str) -> Result<Option<Item>> {
        let items = self.load().await?;
        Ok(items.into_iter().find(|item| item.id == id))
    }

    /// Apply a partial update. Returns `Ok(None)` if the id is unknown.
    pub async fn update(&mut self, id: &str, patch: ItemPatch) -> Result<Option<Item>> {
        let mut items = self.load().await?;

        let Some(item) = items.iter_mut().find(|item| item.id == id) else {
            debug!("Item not found for update: {}", id);
            return Ok(None);
        };
        item.apply(patch);
        let updated = item.clone();

        self.save(&items).await?;

        info!("Updated item: {}", id);
        Ok(Some(updated))
    }

    /// Point a record at a new photo file.
    ///
    /// Returns the updated record and the filename it referenced before, or
    /// `Ok(None)` if the id is unknown.
    pub async fn set_photo(
        &mut self,
        id: &str,
        photo: String,
    ) -> Result<Option<(Item, Option<String>)>> {
        let mut items = self.load().await?;

        let Some(item) = items.iter_mut().find(|item| item.id == id) else {
            debug!("Item not found for photo update: {}", id);
            return Ok(None);
        };
        let previous = item.photo.replace(photo);
        let updated = item.clone();

        self.save(&items).await?;

        info!("Replaced photo for item: {}", id);
        Ok(Some((updated, previous)))
    }
}

/// Write to a sibling temp file, then rename over the target
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
