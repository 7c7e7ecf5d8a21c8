//! Error types and result types for criteria compilation and store operations.
//!
//! Every fallible operation in this crate returns [`SearchLayerResult<T>`]. Compilation
//! failures are raised before any call reaches the store; store failures are carried through
//! verbatim as [`SearchLayerError::Store`].

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised while compiling criteria or talking to a store.
#[derive(Error, Debug)]
pub enum SearchLayerError {
    /// The criteria could not be compiled into a native query.
    ///
    /// Raised before any request is sent to the store.
    #[error("Compilation error: {0}")]
    Compilation(String),
    /// An aggregate query was requested without any `sum`, `average`, `min` or `max` list.
    #[error("Invalid group by: aggregate queries require at least one of sum, average, min or max")]
    InvalidGroupBy,
    /// The store reported no hits container for an update target search.
    #[error("No matching documents found in {0}")]
    NotFound(String),
    /// Any failure surfaced by the store client (network, query syntax, timeout).
    #[error("Store error: {0}")]
    Store(String),
    /// Serialization/deserialization error when converting records to or from models.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// A document body was not a JSON object or otherwise could not be prepared for writing.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// Error during client construction or index bootstrap.
    #[error("Initialization error: {0}")]
    Initialization(String),
}

/// A specialized `Result` type for search layer operations.
pub type SearchLayerResult<T> = Result<T, SearchLayerError>;

impl From<SerdeJsonError> for SearchLayerError {
    fn from(err: SerdeJsonError) -> Self {
        SearchLayerError::Serialization(err.to_string())
    }
}
