//! Convenient re-exports of commonly used types from searchlayer.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use searchlayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - Criteria construction and the `Where` helpers
//! - Store clients and builders
//! - Collection interfaces and the search store
//! - Models, records and error types

pub use searchlayer_core::{
    client::{BulkOperation, BulkResponse, StoreClient, StoreClientBuilder},
    collection::{Collection, FindResult, TypedCollection},
    compiler::{CompiledQuery, Compiler},
    config::CollectionOptions,
    criteria::{Clause, Criteria, CriteriaBuilder, Sort, SortDirection, Where},
    document::{Model, ModelExt, Record},
    error::{SearchLayerError, SearchLayerResult},
    page::{Page, PaginationParams},
    schema::{Attribute, AttributeType, CollectionDefinition, Schema},
    store::SearchStore,
};
pub use searchlayer_macros::Model;
