//! Store client abstraction.
//!
//! The [`StoreClient`] trait is the seam between the CRUD orchestrator and a concrete search
//! store. Implementations speak the store's protocol; the orchestrator only composes calls.
//!
//! # Traits
//!
//! - [`StoreClient`]: The driver interface of a search store
//! - [`StoreClientBuilder`]: Factory trait for creating client instances
//!
//! # Examples
//!
//! ```ignore
//! use searchlayer_core::client::StoreClient;
//! use searchlayer_core::compiler::CompiledQuery;
//!
//! let client = MyClientImpl::new();
//!
//! let hits = client
//!     .search("app", "ticket", &CompiledQuery::match_all("ticket"))
//!     .await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt::Debug, sync::Arc};

use crate::{compiler::CompiledQuery, document::Record, error::SearchLayerResult};

/// One entry of a multi-get response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiGetItem {
    pub id: String,
    /// Whether a document exists under `id`.
    pub found: bool,
    pub source: Option<Record>,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub id: String,
    /// The stored body; `None` when the query asked for hits without source.
    pub source: Option<Record>,
}

/// The hits container of a search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hits {
    /// Total number of matches, regardless of the requested window.
    pub total: u64,
    pub hits: Vec<Hit>,
}

/// The response to a search request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// `None` when the store reported no hits container at all.
    pub hits: Option<Hits>,
    pub aggregations: Option<Value>,
    pub facets: Option<Value>,
}

impl SearchResponse {
    /// The identifiers of the returned hits, in hit order.
    pub fn ids(&self) -> Vec<String> {
        self.hits
            .iter()
            .flat_map(|hits| hits.hits.iter())
            .map(|hit| hit.id.clone())
            .collect()
    }
}

/// A document to be indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// The identifier to index under; the store generates one when `None`.
    pub id: Option<String>,
    pub source: Record,
}

/// The outcome of one bulk operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkItem {
    /// The identifier the operation applied to, including store-generated ones.
    pub id: Option<String>,
    /// The store's error description when the operation failed.
    pub error: Option<String>,
}

/// The response to a bulk request, one item per operation in request order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkResponse {
    pub items: Vec<BulkItem>,
}

impl BulkResponse {
    /// Returns the first failed item, if any.
    pub fn first_error(&self) -> Option<&BulkItem> {
        self.items
            .iter()
            .find(|item| item.error.is_some())
    }

    /// The identifiers of the successful items.
    pub fn ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| item.error.is_none())
            .filter_map(|item| item.id.clone())
            .collect()
    }
}

/// A single operation of a bulk request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum BulkOperation {
    /// Writes `source`, replacing any document with the same identifier.
    Index { id: Option<String>, source: Record },
    /// Writes `source`, failing when a document with the same identifier exists.
    Create { id: Option<String>, source: Record },
    /// Merges `partial` into an existing document.
    Update { id: String, partial: Record },
    Delete { id: String },
}

/// Abstract interface of a search store driver.
///
/// Every method addresses documents of one `type_name` inside one `index`. Implementations own
/// transport concerns such as timeouts and retries; failures surface as
/// [`SearchLayerError::Store`](crate::error::SearchLayerError::Store).
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: one client is shared by every collection and by the
/// concurrent partial updates of an update batch.
#[async_trait]
pub trait StoreClient: Send + Sync + Debug {
    /// Fetches documents by identifier.
    ///
    /// Returns one item per requested identifier, with `found == false` for missing ones.
    async fn multi_get(
        &self,
        index: &str,
        type_name: &str,
        ids: Vec<String>,
    ) -> SearchLayerResult<Vec<MultiGetItem>>;

    /// Runs a compiled query.
    ///
    /// Applies the query's filter, sort, window and aggregations. Hits carry their source
    /// unless the query was built with [`CompiledQuery::without_source`].
    async fn search(
        &self,
        index: &str,
        type_name: &str,
        query: &CompiledQuery,
    ) -> SearchLayerResult<SearchResponse>;

    /// Runs a search body written in the store's own query language.
    ///
    /// The body is sent as it is, without compilation or coercion.
    async fn raw_search(
        &self,
        index: &str,
        type_name: &str,
        body: Value,
    ) -> SearchLayerResult<SearchResponse>;

    /// Indexes documents in one bulk request.
    ///
    /// The default implementation issues [`BulkOperation::Index`] operations through
    /// [`StoreClient::bulk`].
    async fn bulk_index(
        &self,
        index: &str,
        type_name: &str,
        documents: Vec<IndexDocument>,
    ) -> SearchLayerResult<BulkResponse> {
        self.bulk(
            index,
            type_name,
            documents
                .into_iter()
                .map(|document| BulkOperation::Index { id: document.id, source: document.source })
                .collect(),
        )
        .await
    }

    /// Merges `partial` into the document stored under `id`.
    async fn update(
        &self,
        index: &str,
        type_name: &str,
        id: &str,
        partial: Record,
    ) -> SearchLayerResult<()>;

    /// Deletes every document matched by the query's filter.
    async fn delete_by_query(
        &self,
        index: &str,
        type_name: &str,
        query: &CompiledQuery,
    ) -> SearchLayerResult<()>;

    /// Counts the documents matched by the query's filter.
    async fn count(
        &self,
        index: &str,
        type_name: &str,
        query: &CompiledQuery,
    ) -> SearchLayerResult<u64>;

    /// Executes raw bulk operations.
    async fn bulk(
        &self,
        index: &str,
        type_name: &str,
        operations: Vec<BulkOperation>,
    ) -> SearchLayerResult<BulkResponse>;

    /// Releases the client's resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> SearchLayerResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<C> StoreClient for &C
where
    C: StoreClient,
{
    async fn multi_get(
        &self,
        index: &str,
        type_name: &str,
        ids: Vec<String>,
    ) -> SearchLayerResult<Vec<MultiGetItem>> {
        (*self)
            .multi_get(index, type_name, ids)
            .await
    }

    async fn search(
        &self,
        index: &str,
        type_name: &str,
        query: &CompiledQuery,
    ) -> SearchLayerResult<SearchResponse> {
        (*self)
            .search(index, type_name, query)
            .await
    }

    async fn raw_search(
        &self,
        index: &str,
        type_name: &str,
        body: Value,
    ) -> SearchLayerResult<SearchResponse> {
        (*self)
            .raw_search(index, type_name, body)
            .await
    }

    async fn bulk_index(
        &self,
        index: &str,
        type_name: &str,
        documents: Vec<IndexDocument>,
    ) -> SearchLayerResult<BulkResponse> {
        (*self)
            .bulk_index(index, type_name, documents)
            .await
    }

    async fn update(
        &self,
        index: &str,
        type_name: &str,
        id: &str,
        partial: Record,
    ) -> SearchLayerResult<()> {
        (*self)
            .update(index, type_name, id, partial)
            .await
    }

    async fn delete_by_query(
        &self,
        index: &str,
        type_name: &str,
        query: &CompiledQuery,
    ) -> SearchLayerResult<()> {
        (*self)
            .delete_by_query(index, type_name, query)
            .await
    }

    async fn count(
        &self,
        index: &str,
        type_name: &str,
        query: &CompiledQuery,
    ) -> SearchLayerResult<u64> {
        (*self)
            .count(index, type_name, query)
            .await
    }

    async fn bulk(
        &self,
        index: &str,
        type_name: &str,
        operations: Vec<BulkOperation>,
    ) -> SearchLayerResult<BulkResponse> {
        (*self)
            .bulk(index, type_name, operations)
            .await
    }
}

#[async_trait]
impl<C> StoreClient for Arc<C>
where
    C: StoreClient,
{
    async fn multi_get(
        &self,
        index: &str,
        type_name: &str,
        ids: Vec<String>,
    ) -> SearchLayerResult<Vec<MultiGetItem>> {
        (**self)
            .multi_get(index, type_name, ids)
            .await
    }

    async fn search(
        &self,
        index: &str,
        type_name: &str,
        query: &CompiledQuery,
    ) -> SearchLayerResult<SearchResponse> {
        (**self)
            .search(index, type_name, query)
            .await
    }

    async fn raw_search(
        &self,
        index: &str,
        type_name: &str,
        body: Value,
    ) -> SearchLayerResult<SearchResponse> {
        (**self)
            .raw_search(index, type_name, body)
            .await
    }

    async fn bulk_index(
        &self,
        index: &str,
        type_name: &str,
        documents: Vec<IndexDocument>,
    ) -> SearchLayerResult<BulkResponse> {
        (**self)
            .bulk_index(index, type_name, documents)
            .await
    }

    async fn update(
        &self,
        index: &str,
        type_name: &str,
        id: &str,
        partial: Record,
    ) -> SearchLayerResult<()> {
        (**self)
            .update(index, type_name, id, partial)
            .await
    }

    async fn delete_by_query(
        &self,
        index: &str,
        type_name: &str,
        query: &CompiledQuery,
    ) -> SearchLayerResult<()> {
        (**self)
            .delete_by_query(index, type_name, query)
            .await
    }

    async fn count(
        &self,
        index: &str,
        type_name: &str,
        query: &CompiledQuery,
    ) -> SearchLayerResult<u64> {
        (**self)
            .count(index, type_name, query)
            .await
    }

    async fn bulk(
        &self,
        index: &str,
        type_name: &str,
        operations: Vec<BulkOperation>,
    ) -> SearchLayerResult<BulkResponse> {
        (**self)
            .bulk(index, type_name, operations)
            .await
    }
}

/// Factory for store clients that need asynchronous setup, such as index bootstrap.
#[async_trait]
pub trait StoreClientBuilder {
    type Client: StoreClient;

    async fn build(self) -> SearchLayerResult<Self::Client>;
}
