//! Wiring demo: seed an in-process store, browse the catalog, and walk a
//! cart through add, requantify, and remove.
//!
//! Run with: `RUST_LOG=debug cargo run -p canopy-market --example browse`

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use canopy_core::{ItemId, UserId};
use canopy_market::db::catalog::{ALL_CATEGORY, TEXT_SEARCH_FIELDS};
use canopy_market::models::CartItem;
use canopy_market::store::MemoryStore;
use canopy_market::{CartStore, CatalogStore, MarketConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = MarketConfig::from_env()?;
    let store = Arc::new(MemoryStore::new());
    store.create_text_index(&config.item_collection, TEXT_SEARCH_FIELDS);
    for (id, title, category, price) in [
        ("i1", "Leaf Bed", "Rooms", 99.0),
        ("i2", "Branch Desk", "Rooms", 149.0),
        ("i3", "Hammock", "Swings", 49.0),
    ] {
        store.insert_one(
            &config.item_collection,
            json!({
                "_id": id,
                "title": title,
                "category": category,
                "price": price,
                "img_url": format!("/img/{id}.jpg"),
            }),
        )?;
    }

    let catalog = CatalogStore::new(store.clone(), &config);
    let carts = CartStore::new(store, &config);

    for category in catalog.get_categories().await? {
        info!(category = %category.id, count = category.count, "category");
    }
    for item in catalog.get_items(ALL_CATEGORY, 0, 10).await? {
        info!(id = %item.id, title = %item.title, "item");
    }

    let user = UserId::new("demo");
    let item = catalog.get_item(&ItemId::new("i1")).await?;
    let cart = carts
        .add_item(
            &user,
            CartItem {
                id: item.id.clone(),
                title: item.title,
                price: item.price,
                img_url: item.img_url,
                quantity: 1,
            },
        )
        .await?;
    info!(items = cart.items.len(), "added to cart");

    let cart = carts.update_quantity(&user, &item.id, 3).await?;
    info!(
        quantity = cart.items.first().map_or(0, |i| i.quantity),
        "requantified"
    );

    let cart = carts.update_quantity(&user, &item.id, 0).await?;
    info!(items = cart.items.len(), "removed");

    Ok(())
}
