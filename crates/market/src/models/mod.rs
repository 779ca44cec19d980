//! Domain types for carts and catalog items.
//!
//! These types are read-side views over the raw store documents. Defaults
//! for missing fields (cart item quantity, review name/comment) are applied
//! while deserializing and are never written back: write paths manipulate
//! the raw documents so untouched entries round-trip unchanged.

pub mod cart;
pub mod item;

pub use cart::{Cart, CartItem};
pub use item::{CategoryCount, Item, RelatedItem, Review};
