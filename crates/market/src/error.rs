//! Unified error handling for the data layer.
//!
//! Missing documents are never errors here: a missing cart reads as an empty
//! cart, a missing item reads as a default item, and a failed lookup reads
//! as `None`. Only collaborator failures, corrupt documents, and lost
//! read-modify-write rounds surface as [`DataError`].

use thiserror::Error;

use crate::store::StoreError;

/// Data-layer error type.
#[derive(Debug, Error)]
pub enum DataError {
    /// The storage collaborator reported a failure. Not retried here; retry
    /// policy belongs to the caller.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A whole-document replace matched nothing: the document vanished
    /// between the read and the write-back.
    #[error("write conflict: {collection} document {id} vanished during update")]
    WriteConflict {
        /// Collection the write targeted.
        collection: String,
        /// Key of the document that was being replaced.
        id: String,
    },

    /// A stored document does not deserialize into its domain type.
    #[error("corrupt document: {0}")]
    Corrupt(String),
}

/// Result type alias for [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;
