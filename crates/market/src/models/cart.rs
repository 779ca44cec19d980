//! Cart domain types.

use serde::{Deserialize, Deserializer, Serialize};

use canopy_core::{ItemId, UserId};

/// A user's shopping cart.
///
/// At most one cart document exists per non-empty user id. A user with no
/// cart document reads as an empty cart, never as an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    /// Owner of the cart.
    #[serde(rename = "userId", default)]
    pub user_id: UserId,
    /// Selected items, in append order.
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart for the given user.
    #[must_use]
    pub const fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            items: Vec::new(),
        }
    }
}

/// One entry in a cart.
///
/// Display fields (`title`, `price`, `img_url`) are denormalized copies of
/// the catalog item taken at add time; the catalog is not consulted again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Catalog item this entry refers to. Not a foreign key; the store is
    /// document-oriented.
    #[serde(rename = "_id")]
    pub id: ItemId,
    /// Item title at add time.
    #[serde(default)]
    pub title: String,
    /// Item price at add time.
    #[serde(default)]
    pub price: f64,
    /// Item image at add time.
    #[serde(default)]
    pub img_url: String,
    /// Quantity of this item. Absent on read means 1; zero is a removal
    /// signal at the API boundary and is never a stored state.
    #[serde(default = "default_quantity", deserialize_with = "quantity_or_one")]
    pub quantity: i64,
}

const fn default_quantity() -> i64 {
    1
}

/// Missing and null quantities both read as 1.
fn quantity_or_one<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let quantity = Option::<i64>::deserialize(deserializer)?;
    Ok(quantity.unwrap_or_else(default_quantity))
}
