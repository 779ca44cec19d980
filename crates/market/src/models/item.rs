//! Catalog item domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use canopy_core::ItemId;

/// Fallback reviewer name applied on read when a review has none.
pub const ANONYMOUS_REVIEWER: &str = "Anonymous";

/// Fallback comment applied on read when a review has none.
pub const NO_COMMENT: &str = "n/a";

/// A catalog item with its embedded reviews.
///
/// Items are created and maintained by catalog management; this layer only
/// reads them and appends reviews. A missing item reads as
/// `Item::default()`, never as an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Item {
    /// Item key.
    #[serde(rename = "_id", default)]
    pub id: ItemId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub img_url: String,
    #[serde(default)]
    pub slogan: String,
    #[serde(default)]
    pub description: String,
    /// Reviews in append order. Append-only; no edit or delete exists.
    #[serde(default)]
    pub reviews: Vec<Review>,
}

/// A customer review embedded in an item document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Reviewer name; missing or empty reads as [`ANONYMOUS_REVIEWER`].
    #[serde(default = "default_name", deserialize_with = "name_or_anonymous")]
    pub name: String,
    /// Review text; missing or empty reads as [`NO_COMMENT`].
    #[serde(default = "default_comment", deserialize_with = "comment_or_na")]
    pub comment: String,
    /// Star rating.
    #[serde(default)]
    pub stars: i64,
    /// Creation time, set server-side at append time. Stored as epoch
    /// milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds", default = "epoch")]
    pub date: DateTime<Utc>,
}

/// One category with its item count. Derived by aggregation, not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// Category name, or the synthetic `"All"` entry.
    pub id: String,
    /// Number of items in the category.
    pub count: u64,
}

/// A related-items entry, projected down to key and image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedItem {
    #[serde(rename = "_id")]
    pub id: ItemId,
    #[serde(default)]
    pub img_url: String,
}

fn default_name() -> String {
    ANONYMOUS_REVIEWER.to_owned()
}

fn default_comment() -> String {
    NO_COMMENT.to_owned()
}

const fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

fn or_fallback(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(s) if !s.is_empty() => s,
        _ => fallback.to_owned(),
    }
}

fn name_or_anonymous<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(or_fallback(name, ANONYMOUS_REVIEWER))
}

fn comment_or_na<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let comment = Option::<String>::deserialize(deserializer)?;
    Ok(or_fallback(comment, NO_COMMENT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn review_defaults_apply_to_missing_and_empty_fields() {
        let review: Review =
            serde_json::from_value(json!({"stars": 5, "date": 0})).expect("deserialize");
        assert_eq!(review.name, ANONYMOUS_REVIEWER);
        assert_eq!(review.comment, NO_COMMENT);

        let review: Review =
            serde_json::from_value(json!({"name": "", "comment": "", "stars": 5, "date": 0}))
                .expect("deserialize");
        assert_eq!(review.name, ANONYMOUS_REVIEWER);
        assert_eq!(review.comment, NO_COMMENT);
    }

    #[test]
    fn review_keeps_provided_fields() {
        let review: Review = serde_json::from_value(
            json!({"name": "Pat", "comment": "Great", "stars": 4, "date": 1_700_000_000_000_i64}),
        )
        .expect("deserialize");
        assert_eq!(review.name, "Pat");
        assert_eq!(review.comment, "Great");
        assert_eq!(review.date.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn missing_item_fields_default() {
        let item: Item = serde_json::from_value(json!({"_id": "i1"})).expect("deserialize");
        assert_eq!(item.id, ItemId::new("i1"));
        assert!(item.reviews.is_empty());
        assert!(item.title.is_empty());
    }
}
