//! Catalog repository.
//!
//! Read access to catalog items (category aggregation, paginated browse and
//! search, single-item fetch, related items) plus the one catalog write
//! this layer owns: review append.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use canopy_core::ItemId;

use super::locks::KeyedLocks;
use crate::config::MarketConfig;
use crate::error::{DataError, Result};
use crate::models::{CategoryCount, Item, RelatedItem};
use crate::store::{DocumentStore, Filter, FindQuery, Order, Projection, Stage};

/// The synthetic category covering the whole catalog.
pub const ALL_CATEGORY: &str = "All";

/// Fields covered by the catalog text index. Store backends must index
/// these for [`CatalogStore::search_items`] to work.
pub const TEXT_SEARCH_FIELDS: &[&str] = &["title", "slogan", "description"];

/// Group key shown for items without a category.
const UNCATEGORIZED: &str = "(none)";

const RELATED_ITEMS_LIMIT: u64 = 4;

/// Repository for catalog items.
pub struct CatalogStore {
    store: Arc<dyn DocumentStore>,
    collection: String,
    locks: KeyedLocks,
}

impl CatalogStore {
    /// Create a catalog repository over the given store.
    pub fn new(store: Arc<dyn DocumentStore>, config: &MarketConfig) -> Self {
        Self {
            store,
            collection: config.item_collection.clone(),
            locks: KeyedLocks::new(),
        }
    }

    fn category_filter(category: &str) -> Filter {
        if category == ALL_CATEGORY {
            Filter::All
        } else {
            Filter::Eq("category", Value::String(category.to_owned()))
        }
    }

    fn search_filter(query: &str) -> Filter {
        if query.is_empty() {
            Filter::All
        } else {
            Filter::Text(query.to_owned())
        }
    }

    /// Item counts per category, ascending by category name, with the
    /// synthetic [`ALL_CATEGORY`] entry first.
    ///
    /// The `All` count accumulates while the aggregation result is
    /// consumed; there is no second counting query.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Store` if the aggregation fails.
    pub async fn get_categories(&self) -> Result<Vec<CategoryCount>> {
        let docs = self
            .store
            .aggregate(
                &self.collection,
                &[
                    Stage::GroupCount { key: "category" },
                    Stage::Sort {
                        field: "_id",
                        order: Order::Asc,
                    },
                ],
            )
            .await?;

        let mut categories = Vec::with_capacity(docs.len() + 1);
        categories.push(CategoryCount {
            id: ALL_CATEGORY.to_owned(),
            count: 0,
        });

        let mut total = 0;
        for doc in docs {
            let id = doc
                .get("_id")
                .and_then(Value::as_str)
                .unwrap_or(UNCATEGORIZED)
                .to_owned();
            let count = doc.get("count").and_then(Value::as_u64).unwrap_or_default();
            total += count;
            categories.push(CategoryCount { id, count });
        }
        debug!(total, "aggregated item categories");

        if let Some(all) = categories.first_mut() {
            all.count = total;
        }
        Ok(categories)
    }

    /// One page of a category listing, ascending by item key.
    ///
    /// [`ALL_CATEGORY`] means no filter. Pages are zero-indexed windows of
    /// `per_page` items; out-of-range pages yield an empty page.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Store` if the store fails, `DataError::Corrupt`
    /// if an item document does not deserialize.
    pub async fn get_items(&self, category: &str, page: u64, per_page: u64) -> Result<Vec<Item>> {
        let docs = self
            .store
            .find(
                &self.collection,
                FindQuery::new(Self::category_filter(category))
                    .sort("_id", Order::Asc)
                    .skip(page.saturating_mul(per_page))
                    .limit(per_page),
            )
            .await?;
        debug!(category, page, count = docs.len(), "listed items");
        docs.into_iter().map(super::decode).collect()
    }

    /// Number of items in a category, with the same filter semantics as
    /// [`Self::get_items`].
    ///
    /// # Errors
    ///
    /// Returns `DataError::Store` if the store fails.
    pub async fn get_num_items(&self, category: &str) -> Result<u64> {
        let docs = self
            .store
            .find(
                &self.collection,
                FindQuery::new(Self::category_filter(category)).project(&["_id"]),
            )
            .await?;
        Ok(docs.len() as u64)
    }

    /// One page of a text search over title, slogan and description, with
    /// the same sort and pagination contract as [`Self::get_items`].
    ///
    /// An empty query returns the unfiltered listing.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Store` if the store fails (including a missing
    /// text index), `DataError::Corrupt` if an item does not deserialize.
    pub async fn search_items(&self, query: &str, page: u64, per_page: u64) -> Result<Vec<Item>> {
        let docs = self
            .store
            .find(
                &self.collection,
                FindQuery::new(Self::search_filter(query))
                    .sort("_id", Order::Asc)
                    .skip(page.saturating_mul(per_page))
                    .limit(per_page),
            )
            .await?;
        debug!(query, page, count = docs.len(), "searched items");
        docs.into_iter().map(super::decode).collect()
    }

    /// Number of items matching the search predicate of
    /// [`Self::search_items`], independent of pagination.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Store` if the store fails.
    pub async fn get_num_search_items(&self, query: &str) -> Result<u64> {
        let docs = self
            .store
            .find(
                &self.collection,
                FindQuery::new(Self::search_filter(query)).project(&["_id"]),
            )
            .await?;
        Ok(docs.len() as u64)
    }

    /// Fetch a single item by key.
    ///
    /// A missing item (or the sentinel empty key) reads as
    /// `Item::default()`. Reviews missing a name or comment read with
    /// their fallbacks; the fallbacks are never written back.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Store` if the store fails, `DataError::Corrupt`
    /// if the item does not deserialize.
    pub async fn get_item(&self, item_id: &ItemId) -> Result<Item> {
        let filter = if item_id.is_sentinel() {
            Filter::Nothing
        } else {
            Filter::Eq("_id", Value::String(item_id.as_str().to_owned()))
        };
        let doc = self
            .store
            .find_one(&self.collection, filter, Projection::Full)
            .await?;
        match doc {
            Some(doc) => super::decode(doc),
            None => Ok(Item::default()),
        }
    }

    /// Up to four other items, projected to key and image.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Store` if the store fails, `DataError::Corrupt`
    /// if a projected document does not deserialize.
    pub async fn get_related_items(&self, item_id: &ItemId) -> Result<Vec<RelatedItem>> {
        // TODO: replace with a real relatedness policy (category match at
        // minimum); any four other items for now.
        let docs = self
            .store
            .find(
                &self.collection,
                FindQuery::new(Filter::Ne(
                    "_id",
                    Value::String(item_id.as_str().to_owned()),
                ))
                .limit(RELATED_ITEMS_LIMIT)
                .project(&["_id", "img_url"]),
            )
            .await?;
        docs.into_iter().map(super::decode).collect()
    }

    /// Append a review to an item, stamping the creation time server-side.
    ///
    /// Reviews are append-only. The whole item document is written back
    /// under the item's key lock, so two same-item reviews cannot overwrite
    /// each other; reviews for different items run in parallel. Returns the
    /// updated, read-normalized item.
    ///
    /// A missing item reads as `Item::default()` and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `DataError::WriteConflict` if the item document vanished
    /// between the read and the write-back, `DataError::Store` if the store
    /// fails, `DataError::Corrupt` if the item does not deserialize.
    #[instrument(skip_all, fields(item_id = %item_id, stars))]
    pub async fn add_review(
        &self,
        item_id: &ItemId,
        comment: &str,
        name: &str,
        stars: i64,
    ) -> Result<Item> {
        let _guard = self.locks.acquire(item_id.as_str()).await;

        let doc = self
            .store
            .find_one(
                &self.collection,
                Filter::Eq("_id", Value::String(item_id.as_str().to_owned())),
                Projection::Full,
            )
            .await?;
        let Some(mut doc) = doc else {
            debug!("no item to review");
            return Ok(Item::default());
        };

        // The reviewer name and comment are stored exactly as given, empty
        // strings included; the read path supplies the fallbacks.
        let review = json!({
            "name": name,
            "comment": comment,
            "stars": stars,
            "date": Utc::now().timestamp_millis(),
        });
        match doc.get_mut("reviews") {
            Some(Value::Array(reviews)) => reviews.push(review),
            _ => {
                if let Some(fields) = doc.as_object_mut() {
                    fields.insert("reviews".to_owned(), Value::Array(vec![review]));
                }
            }
        }

        let matched = self.store.save(&self.collection, doc.clone()).await?;
        if matched != 1 {
            return Err(DataError::WriteConflict {
                collection: self.collection.clone(),
                id: item_id.as_str().to_owned(),
            });
        }

        super::decode(doc)
    }
}
