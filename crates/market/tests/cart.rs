//! Integration tests for the cart repository over the in-process store.

use std::sync::Arc;

use serde_json::{Value, json};

use canopy_core::{ItemId, UserId};
use canopy_market::models::CartItem;
use canopy_market::store::{
    DocumentStore, Filter, FindQuery, MemoryStore, Projection, Stage, StoreError,
};
use canopy_market::{CartStore, DataError, MarketConfig};

fn cart_store() -> (Arc<MemoryStore>, CartStore) {
    let store = Arc::new(MemoryStore::new());
    let carts = CartStore::new(store.clone(), &MarketConfig::default());
    (store, carts)
}

fn display_item(id: &str, title: &str, quantity: i64) -> CartItem {
    CartItem {
        id: ItemId::new(id),
        title: title.to_owned(),
        price: 10.0,
        img_url: format!("/img/{id}.jpg"),
        quantity,
    }
}

#[tokio::test]
async fn missing_cart_reads_as_empty() {
    let (_, carts) = cart_store();
    let cart = carts.get_cart(&UserId::new("nobody")).await.expect("get");
    assert_eq!(cart.user_id, UserId::new("nobody"));
    assert!(cart.items.is_empty());
}

#[tokio::test]
async fn sentinel_user_never_matches_a_document() {
    let (store, carts) = cart_store();
    // Even a stored document under the empty key must not be reachable.
    store
        .insert_one(
            "cart",
            json!({"userId": "", "items": [{"_id": "ghost", "quantity": 1}]}),
        )
        .expect("seed");

    let cart = carts.get_cart(&UserId::new("")).await.expect("get");
    assert!(cart.items.is_empty());

    let found = carts
        .item_in_cart(&UserId::new(""), &ItemId::new("ghost"))
        .await
        .expect("scan");
    assert!(found.is_none());
}

#[tokio::test]
async fn add_item_creates_the_cart_then_appends_in_order() {
    let (_, carts) = cart_store();
    let user = UserId::new("u1");

    let cart = carts
        .add_item(&user, display_item("i1", "Leaf Bed", 1))
        .await
        .expect("add");
    assert_eq!(cart.items.len(), 1);

    let cart = carts
        .add_item(&user, display_item("i2", "Hammock", 2))
        .await
        .expect("add");
    let ids: Vec<_> = cart.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["i1", "i2"]);
}

#[tokio::test]
async fn different_users_get_independent_carts() {
    let (_, carts) = cart_store();
    let u1 = UserId::new("u1");
    let u2 = UserId::new("u2");

    carts
        .add_item(&u1, display_item("i1", "Leaf Bed", 1))
        .await
        .expect("add");
    carts
        .add_item(&u2, display_item("i2", "Hammock", 1))
        .await
        .expect("add");
    carts
        .add_item(&u1, display_item("i3", "Branch Desk", 1))
        .await
        .expect("add");

    let cart1 = carts.get_cart(&u1).await.expect("get");
    let cart2 = carts.get_cart(&u2).await.expect("get");
    let ids1: Vec<_> = cart1.items.iter().map(|i| i.id.as_str()).collect();
    let ids2: Vec<_> = cart2.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids1, ["i1", "i3"]);
    assert_eq!(ids2, ["i2"]);
}

#[tokio::test]
async fn concurrent_appends_for_one_user_are_both_preserved() {
    let (_, carts) = cart_store();
    let carts = Arc::new(carts);
    let user = UserId::new("u1");

    let a = {
        let carts = Arc::clone(&carts);
        let user = user.clone();
        tokio::spawn(async move { carts.add_item(&user, display_item("i1", "A", 1)).await })
    };
    let b = {
        let carts = Arc::clone(&carts);
        let user = user.clone();
        tokio::spawn(async move { carts.add_item(&user, display_item("i2", "B", 1)).await })
    };
    a.await.expect("join").expect("add");
    b.await.expect("join").expect("add");

    let cart = carts.get_cart(&user).await.expect("get");
    let mut ids: Vec<_> = cart.items.iter().map(|i| i.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, ["i1", "i2"]);
}

#[tokio::test]
async fn absent_quantity_reads_as_one_without_being_persisted() {
    let (store, carts) = cart_store();
    store
        .insert_one(
            "cart",
            json!({"userId": "u1", "items": [{"_id": "i1", "title": "Leaf Bed"}]}),
        )
        .expect("seed");

    let cart = carts.get_cart(&UserId::new("u1")).await.expect("get");
    assert_eq!(cart.items.first().map(|i| i.quantity), Some(1));

    // The default is a read-time view only; the stored entry still has no
    // quantity field.
    let raw = store
        .find_one(
            "cart",
            Filter::Eq("userId", json!("u1")),
            Projection::Full,
        )
        .await
        .expect("find")
        .expect("present");
    let entry = raw
        .get("items")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .and_then(Value::as_object)
        .expect("entry");
    assert!(!entry.contains_key("quantity"));
}

#[tokio::test]
async fn item_in_cart_scans_for_the_item() {
    let (_, carts) = cart_store();
    let user = UserId::new("u1");
    carts
        .add_item(&user, display_item("i1", "Leaf Bed", 2))
        .await
        .expect("add");

    let found = carts
        .item_in_cart(&user, &ItemId::new("i1"))
        .await
        .expect("scan")
        .expect("present");
    assert_eq!(found.title, "Leaf Bed");
    assert_eq!(found.quantity, 2);

    let missing = carts
        .item_in_cart(&user, &ItemId::new("i9"))
        .await
        .expect("scan");
    assert!(missing.is_none());
}

#[tokio::test]
async fn update_quantity_sets_the_match_and_leaves_the_rest_untouched() {
    let (_, carts) = cart_store();
    let user = UserId::new("u1");
    for item in [
        display_item("i1", "Leaf Bed", 1),
        display_item("i2", "Hammock", 1),
        display_item("i3", "Branch Desk", 1),
    ] {
        carts.add_item(&user, item).await.expect("add");
    }

    let cart = carts
        .update_quantity(&user, &ItemId::new("i2"), 7)
        .await
        .expect("update");
    let ids: Vec<_> = cart.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["i1", "i2", "i3"]);
    assert_eq!(cart.items.get(1).map(|i| i.quantity), Some(7));
    assert_eq!(cart.items.first(), Some(&display_item("i1", "Leaf Bed", 1)));
    assert_eq!(cart.items.get(2), Some(&display_item("i3", "Branch Desk", 1)));
}

#[tokio::test]
async fn quantity_zero_removes_exactly_the_match() {
    let (_, carts) = cart_store();
    let user = UserId::new("u1");
    for item in [
        display_item("i1", "Leaf Bed", 1),
        display_item("i2", "Hammock", 1),
    ] {
        carts.add_item(&user, item).await.expect("add");
    }

    let cart = carts
        .update_quantity(&user, &ItemId::new("i1"), 0)
        .await
        .expect("update");
    let ids: Vec<_> = cart.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["i2"]);
}

#[tokio::test]
async fn negative_quantity_behaves_like_zero() {
    let (_, carts) = cart_store();
    let user = UserId::new("u1");
    carts
        .add_item(&user, display_item("i1", "Leaf Bed", 1))
        .await
        .expect("add");

    let cart = carts
        .update_quantity(&user, &ItemId::new("i1"), -3)
        .await
        .expect("update");
    assert!(cart.items.is_empty());
}

#[tokio::test]
async fn update_quantity_without_a_cart_writes_nothing() {
    let (store, carts) = cart_store();
    let cart = carts
        .update_quantity(&UserId::new("u1"), &ItemId::new("i1"), 3)
        .await
        .expect("update");
    assert!(cart.items.is_empty());

    // add_item is the only creation path; no document may appear here.
    let raw = store
        .find_one("cart", Filter::Eq("userId", json!("u1")), Projection::Full)
        .await
        .expect("find");
    assert!(raw.is_none());
}

#[tokio::test]
async fn concurrent_updates_on_one_cart_both_take_effect() {
    let (_, carts) = cart_store();
    let carts = Arc::new(carts);
    let user = UserId::new("u1");
    for item in [
        display_item("i1", "Leaf Bed", 1),
        display_item("i2", "Hammock", 1),
    ] {
        carts.add_item(&user, item).await.expect("add");
    }

    let a = {
        let carts = Arc::clone(&carts);
        let user = user.clone();
        tokio::spawn(async move { carts.update_quantity(&user, &ItemId::new("i1"), 5).await })
    };
    let b = {
        let carts = Arc::clone(&carts);
        let user = user.clone();
        tokio::spawn(async move { carts.update_quantity(&user, &ItemId::new("i2"), 9).await })
    };
    a.await.expect("join").expect("update");
    b.await.expect("join").expect("update");

    let cart = carts.get_cart(&user).await.expect("get");
    let quantities: Vec<_> = cart.items.iter().map(|i| (i.id.as_str(), i.quantity)).collect();
    assert_eq!(quantities, [("i1", 5), ("i2", 9)]);
}

#[tokio::test]
async fn full_cart_walkthrough() {
    let (_, carts) = cart_store();
    let user = UserId::new("u1");

    let cart = carts
        .add_item(&user, display_item("i1", "Leaf", 1))
        .await
        .expect("add");
    assert_eq!(cart.items.first().map(|i| i.quantity), Some(1));

    let cart = carts
        .update_quantity(&user, &ItemId::new("i1"), 3)
        .await
        .expect("update");
    assert_eq!(cart.items.first().map(|i| i.quantity), Some(3));

    carts
        .update_quantity(&user, &ItemId::new("i1"), 0)
        .await
        .expect("update");
    let cart = carts.get_cart(&user).await.expect("get");
    assert!(cart.items.is_empty());
}

/// Store double whose whole-document replaces always miss, as if the
/// document vanished between the read and the write-back.
struct VanishingStore(MemoryStore);

#[async_trait::async_trait]
impl DocumentStore for VanishingStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: Filter,
        projection: Projection,
    ) -> Result<Option<Value>, StoreError> {
        self.0.find_one(collection, filter, projection).await
    }

    async fn find(&self, collection: &str, query: FindQuery) -> Result<Vec<Value>, StoreError> {
        self.0.find(collection, query).await
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Stage],
    ) -> Result<Vec<Value>, StoreError> {
        self.0.aggregate(collection, pipeline).await
    }

    async fn push(
        &self,
        collection: &str,
        filter: Filter,
        field: &str,
        value: Value,
    ) -> Result<Value, StoreError> {
        self.0.push(collection, filter, field, value).await
    }

    async fn save(&self, _collection: &str, _doc: Value) -> Result<u64, StoreError> {
        Ok(0)
    }
}

#[tokio::test]
async fn lost_write_back_surfaces_as_a_conflict() {
    let inner = MemoryStore::new();
    inner
        .insert_one(
            "cart",
            json!({"userId": "u1", "items": [{"_id": "i1", "quantity": 1}]}),
        )
        .expect("seed");
    let carts = CartStore::new(Arc::new(VanishingStore(inner)), &MarketConfig::default());

    let err = carts
        .update_quantity(&UserId::new("u1"), &ItemId::new("i1"), 2)
        .await
        .expect_err("conflict");
    assert!(matches!(err, DataError::WriteConflict { .. }));
}
