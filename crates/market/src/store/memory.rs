//! In-process document store.
//!
//! Collections are vectors of JSON documents behind a single `RwLock`, so
//! every operation is atomic at the store level. Insertion order is the
//! natural order of unsorted reads, matching document-store behavior.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use super::{DocumentStore, Filter, FindQuery, Order, Projection, Stage, StoreError};

/// In-memory [`DocumentStore`] implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

#[derive(Debug, Default)]
struct Collection {
    docs: Vec<Value>,
    text_fields: Option<Vec<String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a text index over the given fields of a collection.
    /// Required before [`Filter::Text`] queries against it.
    pub fn create_text_index(&self, collection: &str, fields: &[&str]) {
        let mut collections = self.collections.write();
        collections
            .entry(collection.to_owned())
            .or_default()
            .text_fields = Some(fields.iter().map(|&f| f.to_owned()).collect());
    }

    /// Insert a document, assigning a UUID `_id` if it has none. Returns
    /// the document's `_id`.
    ///
    /// This is a backend loading surface (seeding catalogs, tests); the
    /// data layer itself never inserts documents directly.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidDocument` if `doc` is not a JSON object.
    pub fn insert_one(&self, collection: &str, mut doc: Value) -> Result<Value, StoreError> {
        let Some(fields) = doc.as_object_mut() else {
            return Err(StoreError::InvalidDocument(
                "documents must be JSON objects".to_owned(),
            ));
        };
        let id = fields
            .entry("_id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()))
            .clone();

        let mut collections = self.collections.write();
        collections
            .entry(collection.to_owned())
            .or_default()
            .docs
            .push(doc);
        Ok(id)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: Filter,
        projection: Projection,
    ) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read();
        let Some(coll) = collections.get(collection) else {
            return Ok(None);
        };
        for doc in &coll.docs {
            if doc_matches(&filter, doc, coll.text_fields.as_deref(), collection)? {
                return Ok(Some(project(doc, &projection)));
            }
        }
        Ok(None)
    }

    async fn find(&self, collection: &str, query: FindQuery) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read();
        let Some(coll) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut selected = Vec::new();
        for doc in &coll.docs {
            if doc_matches(&query.filter, doc, coll.text_fields.as_deref(), collection)? {
                selected.push(doc.clone());
            }
        }

        if let Some((field, order)) = query.sort {
            sort_docs(&mut selected, field, order);
        }

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));

        Ok(selected
            .iter()
            .skip(skip)
            .take(limit)
            .map(|doc| project(doc, &query.projection))
            .collect())
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Stage],
    ) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read();
        let mut current = collections
            .get(collection)
            .map(|coll| coll.docs.clone())
            .unwrap_or_default();

        for stage in pipeline {
            match stage {
                Stage::GroupCount { key } => current = group_count(&current, key),
                Stage::Sort { field, order } => sort_docs(&mut current, field, *order),
            }
        }
        Ok(current)
    }

    async fn push(
        &self,
        collection: &str,
        filter: Filter,
        field: &str,
        value: Value,
    ) -> Result<Value, StoreError> {
        let mut collections = self.collections.write();
        let coll = collections.entry(collection.to_owned()).or_default();

        let mut pos = None;
        for (i, doc) in coll.docs.iter().enumerate() {
            if doc_matches(&filter, doc, coll.text_fields.as_deref(), collection)? {
                pos = Some(i);
                break;
            }
        }

        if let Some(i) = pos {
            let doc = coll
                .docs
                .get_mut(i)
                .ok_or_else(|| StoreError::Unavailable("collection shrank mid-update".to_owned()))?;
            let Some(fields) = doc.as_object_mut() else {
                return Err(StoreError::InvalidDocument(
                    "matched document is not a JSON object".to_owned(),
                ));
            };
            match fields.get_mut(field) {
                Some(Value::Array(entries)) => entries.push(value),
                _ => {
                    fields.insert(field.to_owned(), Value::Array(vec![value]));
                }
            }
            return Ok(doc.clone());
        }

        // Upsert: seed the new document from the filter's equality fields.
        let mut fields = Map::new();
        fields.insert("_id".to_owned(), Value::String(Uuid::new_v4().to_string()));
        if let Filter::Eq(key, expected) = &filter {
            fields.insert((*key).to_owned(), expected.clone());
        }
        fields.insert(field.to_owned(), Value::Array(vec![value]));
        let doc = Value::Object(fields);
        coll.docs.push(doc.clone());
        Ok(doc)
    }

    async fn save(&self, collection: &str, doc: Value) -> Result<u64, StoreError> {
        let Some(id) = doc.get("_id").cloned() else {
            return Err(StoreError::InvalidDocument(
                "whole-document replace requires an _id".to_owned(),
            ));
        };

        let mut collections = self.collections.write();
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(0);
        };
        match coll.docs.iter_mut().find(|d| d.get("_id") == Some(&id)) {
            Some(slot) => {
                *slot = doc;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

fn doc_matches(
    filter: &Filter,
    doc: &Value,
    text_fields: Option<&[String]>,
    collection: &str,
) -> Result<bool, StoreError> {
    match filter {
        Filter::All => Ok(true),
        Filter::Nothing => Ok(false),
        Filter::Eq(field, expected) => Ok(doc.get(field) == Some(expected)),
        Filter::Ne(field, expected) => Ok(doc.get(field) != Some(expected)),
        Filter::Text(needle) => {
            let Some(fields) = text_fields else {
                return Err(StoreError::NoTextIndex {
                    collection: collection.to_owned(),
                });
            };
            let needle = needle.to_lowercase();
            Ok(fields.iter().any(|field| {
                doc.get(field)
                    .and_then(Value::as_str)
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            }))
        }
    }
}

fn sort_docs(docs: &mut [Value], field: &str, order: Order) {
    docs.sort_by(|a, b| {
        let ordering = value_cmp(a.get(field), b.get(field));
        match order {
            Order::Asc => ordering,
            Order::Desc => ordering.reverse(),
        }
    });
}

/// Total order over the value shapes this store holds: null, then numbers,
/// then strings, then everything else.
fn value_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(_) => 3,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn group_count(docs: &[Value], key: &str) -> Vec<Value> {
    let mut groups: Vec<(Value, u64)> = Vec::new();
    for doc in docs {
        let group_key = doc.get(key).cloned().unwrap_or(Value::Null);
        match groups.iter_mut().find(|(k, _)| *k == group_key) {
            Some((_, count)) => *count += 1,
            None => groups.push((group_key, 1)),
        }
    }
    groups
        .into_iter()
        .map(|(k, count)| json!({"_id": k, "count": count}))
        .collect()
}

fn project(doc: &Value, projection: &Projection) -> Value {
    match projection {
        Projection::Full => doc.clone(),
        Projection::Fields(fields) => {
            let mut projected = Map::new();
            for &field in fields {
                if let Some(value) = doc.get(field) {
                    projected.insert(field.to_owned(), value.clone());
                }
            }
            Value::Object(projected)
        }
    }
}
