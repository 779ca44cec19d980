//! Cart repository.
//!
//! Owns the "one cart document per user" invariant. The empty-string user
//! id is the reserved "no cart" sentinel and maps to a guaranteed-no-match
//! filter, so it always reads as an empty cart.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use canopy_core::{ItemId, UserId};

use super::locks::KeyedLocks;
use crate::config::MarketConfig;
use crate::error::{DataError, Result};
use crate::models::{Cart, CartItem};
use crate::store::{DocumentStore, Filter, Projection};

/// Repository for per-user shopping carts.
pub struct CartStore {
    store: Arc<dyn DocumentStore>,
    collection: String,
    locks: KeyedLocks,
}

impl CartStore {
    /// Create a cart repository over the given store.
    pub fn new(store: Arc<dyn DocumentStore>, config: &MarketConfig) -> Self {
        Self {
            store,
            collection: config.cart_collection.clone(),
            locks: KeyedLocks::new(),
        }
    }

    fn key_filter(user_id: &UserId) -> Filter {
        if user_id.is_sentinel() {
            Filter::Nothing
        } else {
            Filter::Eq("userId", Value::String(user_id.as_str().to_owned()))
        }
    }

    /// Fetch the cart for a user.
    ///
    /// A missing cart (or the sentinel user id) reads as an empty cart.
    /// Items with no stored quantity read as quantity 1; the default is
    /// never written back.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Store` if the store fails, `DataError::Corrupt`
    /// if the cart document does not deserialize.
    pub async fn get_cart(&self, user_id: &UserId) -> Result<Cart> {
        debug!(user_id = %user_id, "loading cart");
        let doc = self
            .store
            .find_one(
                &self.collection,
                Self::key_filter(user_id),
                Projection::Fields(vec!["userId", "items"]),
            )
            .await?;

        match doc {
            Some(doc) => {
                let mut cart: Cart = super::decode(doc)?;
                cart.user_id = user_id.clone();
                Ok(cart)
            }
            None => Ok(Cart::empty(user_id.clone())),
        }
    }

    /// Find a single item in a user's cart.
    ///
    /// Returns `None` when the cart is absent or holds no such item.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Store` if the store fails, `DataError::Corrupt`
    /// if the cart document does not deserialize.
    pub async fn item_in_cart(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
    ) -> Result<Option<CartItem>> {
        let doc = self
            .store
            .find_one(
                &self.collection,
                Self::key_filter(user_id),
                Projection::Fields(vec!["items"]),
            )
            .await?;

        let Some(doc) = doc else {
            return Ok(None);
        };
        let cart: Cart = super::decode(doc)?;
        let matched = cart.items.into_iter().find(|item| item.id == *item_id);
        debug!(
            user_id = %user_id,
            item_id = %item_id,
            found = matched.is_some(),
            "scanned cart for item"
        );
        Ok(matched)
    }

    /// Append an item to a user's cart, creating the cart if absent.
    ///
    /// This is a single atomic append-with-upsert at the store, so
    /// concurrent appends for the same user are both preserved. It is also
    /// the only path that creates a cart document. Returns the post-update
    /// cart.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Store` if the store fails, `DataError::Corrupt`
    /// if the post-image does not deserialize.
    pub async fn add_item(&self, user_id: &UserId, item: CartItem) -> Result<Cart> {
        debug!(user_id = %user_id, item_id = %item.id, "appending item to cart");
        let entry = serde_json::to_value(&item).map_err(|e| DataError::Corrupt(e.to_string()))?;
        let doc = self
            .store
            .push(
                &self.collection,
                Filter::Eq("userId", Value::String(user_id.as_str().to_owned())),
                "items",
                entry,
            )
            .await?;

        let mut cart: Cart = super::decode(doc)?;
        cart.user_id = user_id.clone();
        Ok(cart)
    }

    /// Set the quantity of a cart item, or remove it when `quantity <= 0`.
    ///
    /// Rebuilds the stored item list: the matching entry is updated or
    /// dropped, every other entry passes through untouched and in its
    /// original position. The whole document is then written back under the
    /// user's key lock, so two same-user updates cannot overwrite each
    /// other; updates for different users run in parallel.
    ///
    /// A user with no cart gets an empty cart back and no write happens;
    /// [`Self::add_item`] is the only creation path.
    ///
    /// # Errors
    ///
    /// Returns `DataError::WriteConflict` if the cart document vanished
    /// between the read and the write-back, `DataError::Store` if the store
    /// fails, `DataError::Corrupt` if the document does not deserialize.
    #[instrument(skip_all, fields(user_id = %user_id, item_id = %item_id, quantity))]
    pub async fn update_quantity(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
        quantity: i64,
    ) -> Result<Cart> {
        let _guard = self.locks.acquire(user_id.as_str()).await;

        let doc = self
            .store
            .find_one(&self.collection, Self::key_filter(user_id), Projection::Full)
            .await?;
        let Some(mut doc) = doc else {
            debug!("no cart to update");
            return Ok(Cart::empty(user_id.clone()));
        };

        if let Some(entries) = doc.get_mut("items").and_then(Value::as_array_mut) {
            let mut rebuilt = Vec::with_capacity(entries.len());
            for mut entry in entries.drain(..) {
                if entry.get("_id").and_then(Value::as_str) == Some(item_id.as_str()) {
                    // Quantity zero (or less) is the removal signal: the
                    // entry is simply not carried over.
                    if quantity > 0 {
                        if let Some(fields) = entry.as_object_mut() {
                            fields.insert("quantity".to_owned(), Value::from(quantity));
                        }
                        rebuilt.push(entry);
                    }
                } else {
                    rebuilt.push(entry);
                }
            }
            *entries = rebuilt;
        }

        let matched = self.store.save(&self.collection, doc.clone()).await?;
        if matched != 1 {
            return Err(DataError::WriteConflict {
                collection: self.collection.clone(),
                id: user_id.as_str().to_owned(),
            });
        }

        let mut cart: Cart = super::decode(doc)?;
        cart.user_id = user_id.clone();
        Ok(cart)
    }
}
