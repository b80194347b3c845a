pub mod error;
pub mod item;

pub use error::{Error, Result};
pub use item::{Item, ItemPatch};
