//! Storage collaborator contract.
//!
//! The data layer talks to a document-oriented store through the
//! [`DocumentStore`] trait. Each operation succeeds or fails atomically at
//! the single-document level only; there are no transactions and no
//! snapshot isolation across documents. Cursor-shaped reads are
//! materialized: the callers here always consume results fully.
//!
//! [`memory::MemoryStore`] is the in-process implementation, used by tests
//! and by embedders that do not need an external store.

pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryStore;

/// Errors reported by a storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not serve the request. Not retried by the data
    /// layer.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A text filter was applied to a collection without a text index.
    #[error("no text index on collection {collection}")]
    NoTextIndex {
        /// Collection the text filter targeted.
        collection: String,
    },

    /// A document handed to the store was unusable (e.g. a whole-document
    /// replace without an `_id`).
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Document selection predicate.
///
/// Equality filters double as upsert seeds: when [`DocumentStore::push`]
/// creates a document, the new document carries the filter's field/value.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Match every document.
    All,
    /// Match no document. Used for the reserved empty-string sentinel keys,
    /// which must never match a real document.
    Nothing,
    /// Field equals value. A missing field never matches.
    Eq(&'static str, Value),
    /// Field differs from value. A missing field matches.
    Ne(&'static str, Value),
    /// Text-index search. Requires a text index on the collection.
    Text(String),
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// Field selection for read results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Return whole documents.
    Full,
    /// Return only the listed fields (no implicit `_id`).
    Fields(Vec<&'static str>),
}

/// A composed `find` request: filter plus sort/skip/limit/projection,
/// mirroring the fluent cursor surface of document stores.
#[derive(Debug, Clone)]
pub struct FindQuery {
    pub filter: Filter,
    pub sort: Option<(&'static str, Order)>,
    pub skip: u64,
    pub limit: Option<u64>,
    pub projection: Projection,
}

impl FindQuery {
    /// Start a query with the given filter and no windowing.
    #[must_use]
    pub const fn new(filter: Filter) -> Self {
        Self {
            filter,
            sort: None,
            skip: 0,
            limit: None,
            projection: Projection::Full,
        }
    }

    /// Sort results by a field.
    #[must_use]
    pub fn sort(mut self, field: &'static str, order: Order) -> Self {
        self.sort = Some((field, order));
        self
    }

    /// Skip the first `n` results (after sorting).
    #[must_use]
    pub fn skip(mut self, n: u64) -> Self {
        self.skip = n;
        self
    }

    /// Return at most `n` results.
    #[must_use]
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Project results down to the listed fields.
    #[must_use]
    pub fn project(mut self, fields: &[&'static str]) -> Self {
        self.projection = Projection::Fields(fields.to_vec());
        self
    }
}

/// One aggregation pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Group documents by a field and count each group. Yields documents of
    /// the shape `{"_id": <group key>, "count": <n>}`; documents missing
    /// the field group under a null key.
    GroupCount { key: &'static str },
    /// Sort the current documents by a field.
    Sort { field: &'static str, order: Order },
}

/// A document-oriented store, atomic at the single-document level.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Return the first document matching `filter`, projected.
    async fn find_one(
        &self,
        collection: &str,
        filter: Filter,
        projection: Projection,
    ) -> Result<Option<Value>, StoreError>;

    /// Return all documents selected by the query, in sort order (or
    /// insertion order when unsorted).
    async fn find(&self, collection: &str, query: FindQuery) -> Result<Vec<Value>, StoreError>;

    /// Run an aggregation pipeline over the collection.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Stage],
    ) -> Result<Vec<Value>, StoreError>;

    /// Atomically append `value` to the array field of the first document
    /// matching `filter`, creating the document if none matches (upsert).
    /// Returns the post-image of the updated document.
    async fn push(
        &self,
        collection: &str,
        filter: Filter,
        field: &str,
        value: Value,
    ) -> Result<Value, StoreError>;

    /// Replace the whole document whose `_id` matches `doc`'s, returning
    /// the matched count. Callers must treat a count other than 1 as a
    /// conflict: the document vanished between their read and this write.
    async fn save(&self, collection: &str, doc: Value) -> Result<u64, StoreError>;
}
