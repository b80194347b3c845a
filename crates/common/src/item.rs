//! Inventory item record

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered inventory item, as persisted in `inventory.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier, fixed at creation
    pub id: String,

    /// Display name
    pub name: String,

    /// Free-form description, empty when none was given
    #[serde(default)]
    pub description: String,

    /// Stored photo filename inside the photo directory
    pub photo: Option<String>,
}

impl Item {
    /// Create a new item with a freshly generated id
    pub fn new(name: String, description: Option<String>, photo: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description: description.unwrap_or_default(),
            photo,
        }
    }

    /// Apply a partial update. Only fields present in the patch are written.
    pub fn apply(&mut self, patch: ItemPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
    }
}

/// Partial update of an item's mutable text fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ItemPatch {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}
