//! Store-facing repositories.
//!
//! # Collections
//!
//! - `cart` - one document per user: `{_id, userId, items: [...]}`
//! - `item` - catalog items: `{_id, title, category, price, img_url,
//!   slogan, description, reviews: [...]}`
//!
//! Both repositories are leaves over the [`crate::store::DocumentStore`]
//! collaborator and are independent of each other. They normalize missing
//! documents to empty results; see [`crate::error`] for what does surface
//! as a failure.

pub mod cart;
pub mod catalog;
mod locks;

pub use cart::CartStore;
pub use catalog::CatalogStore;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{DataError, Result};

/// Decode a stored document into a domain type, surfacing serde failures
/// as corruption.
pub(crate) fn decode<T: DeserializeOwned>(doc: Value) -> Result<T> {
    serde_json::from_value(doc).map_err(|e| DataError::Corrupt(e.to_string()))
}
