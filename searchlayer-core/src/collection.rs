//! CRUD orchestration over one collection.
//!
//! A [`Collection`] binds a normalized [`CollectionSchema`] to a [`StoreClient`] and an index.
//! Its operations compensate for a search store that is eventually consistent and does not
//! return full documents on write:
//!
//! - writes are followed by a multi-get of the written identifiers (hydration);
//! - updates and destroys first search for the live match set, then mutate it;
//! - finds that are exactly an identifier lookup bypass the search entirely.
//!
//! # Collection Types
//!
//! - [`Collection`] - Untyped collection exchanging [`Record`]s
//! - [`TypedCollection`] - Collection exchanging values of a [`Model`]
//!
//! # Example
//!
//! ```ignore
//! use searchlayer_core::criteria::{Criteria, Where};
//!
//! # async fn example(store: &searchlayer_core::store::SearchStore<impl searchlayer_core::client::StoreClient>) -> searchlayer_core::error::SearchLayerResult<()> {
//! let tickets = store.collection(definition);
//!
//! let open = tickets
//!     .find(&Criteria::builder().filter(Where::eq("status", "open")).build())
//!     .await?
//!     .into_documents();
//! # Ok(()) }
//! ```

use futures::{StreamExt, stream};
use serde_json::Value;
use std::marker::PhantomData;

use crate::{
    client::{BulkOperation, BulkResponse, IndexDocument, SearchResponse, StoreClient},
    compiler::{CompiledQuery, Compiler},
    config::CollectionOptions,
    criteria::Criteria,
    document::{Model, ModelExt, Record},
    error::{SearchLayerError, SearchLayerResult},
    normalizer::{hydrate, prepare_document},
    page::{Page, PaginationParams},
    schema::{CollectionSchema, ID_FIELD, Schema},
};

/// The result of a find.
#[derive(Debug, Clone, PartialEq)]
pub enum FindResult {
    /// Plain documents.
    Documents(Vec<Record>),
    /// Documents of an aggregate or faceted query, with the store's payloads.
    Aggregate {
        documents: Vec<Record>,
        aggregations: Option<Value>,
        facets: Option<Value>,
    },
}

impl FindResult {
    pub fn documents(&self) -> &[Record] {
        match self {
            FindResult::Documents(documents) => documents,
            FindResult::Aggregate { documents, .. } => documents,
        }
    }

    pub fn into_documents(self) -> Vec<Record> {
        match self {
            FindResult::Documents(documents) => documents,
            FindResult::Aggregate { documents, .. } => documents,
        }
    }

    /// The aggregation payload, for aggregate queries.
    pub fn aggregations(&self) -> Option<&Value> {
        match self {
            FindResult::Documents(_) => None,
            FindResult::Aggregate { aggregations, .. } => aggregations.as_ref(),
        }
    }

    /// The facet payload, for faceted queries.
    pub fn facets(&self) -> Option<&Value> {
        match self {
            FindResult::Documents(_) => None,
            FindResult::Aggregate { facets, .. } => facets.as_ref(),
        }
    }
}

/// The outcome of a concurrent batch of partial updates.
#[derive(Debug, Default)]
pub struct UpdateBatch {
    /// Identifiers whose update completed, in completion order.
    pub completed: Vec<String>,
    /// The first failure; no further updates were started after it.
    pub failure: Option<SearchLayerError>,
}

impl UpdateBatch {
    /// Returns the completed identifiers, or the failure if there was one.
    ///
    /// # Errors
    ///
    /// Returns the batch's first failure.
    pub fn into_result(self) -> SearchLayerResult<Vec<String>> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self.completed),
        }
    }
}

/// An untyped collection with a reference to a store client.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the client reference
/// * `C` - The store client type
#[derive(Debug)]
pub struct Collection<'a, C: StoreClient> {
    index: String,
    collection: CollectionSchema,
    options: CollectionOptions,
    client: &'a C,
}

impl<'a, C: StoreClient> Collection<'a, C> {
    pub(crate) fn new(index: impl Into<String>, collection: CollectionSchema, client: &'a C) -> Self {
        Self {
            index: index.into(),
            collection,
            options: CollectionOptions::default(),
            client,
        }
    }

    /// Replaces the orchestration settings of this collection.
    pub fn with_options(mut self, options: CollectionOptions) -> Self {
        self.options = options;
        self
    }

    /// The store type name of this collection.
    pub fn identity(&self) -> &str {
        self.collection.identity()
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn schema(&self) -> &Schema {
        self.collection.schema()
    }

    pub fn options(&self) -> &CollectionOptions {
        &self.options
    }

    /// Compiles criteria for this collection without running them.
    ///
    /// # Errors
    ///
    /// Returns the compiler's [`SearchLayerError::InvalidGroupBy`].
    pub fn compile(&self, criteria: &Criteria) -> SearchLayerResult<CompiledQuery> {
        Compiler::new(self.schema(), self.identity()).compile(criteria)
    }

    /// Finds the documents matching `criteria`.
    ///
    /// A where-clause that is exactly `{id: value}` or `{id: [values]}` is answered with a
    /// multi-get; missing identifiers are omitted. Any other criteria are compiled and searched.
    /// Aggregate and faceted queries return their payloads next to the documents.
    ///
    /// # Errors
    ///
    /// Returns compilation errors before any store call, or the client's
    /// [`SearchLayerError::Store`].
    pub async fn find(&self, criteria: &Criteria) -> SearchLayerResult<FindResult> {
        if let Some(ids) = criteria.id_lookup() {
            tracing::debug!(type_name = %self.identity(), ids = ids.len(), "identifier lookup");

            return Ok(FindResult::Documents(self.fetch(ids).await?));
        }

        let query = self.compile(criteria)?;
        let response = self
            .client
            .search(&self.index, self.identity(), &query)
            .await?;

        let documents: Vec<Record> = response
            .hits
            .into_iter()
            .flat_map(|hits| hits.hits)
            .map(|hit| hydrate(&hit.id, hit.source.unwrap_or_default()))
            .collect();

        tracing::debug!(type_name = %self.identity(), documents = documents.len(), "search completed");

        if query.has_payloads() {
            Ok(FindResult::Aggregate {
                documents,
                aggregations: response.aggregations,
                facets: response.facets,
            })
        } else {
            Ok(FindResult::Documents(documents))
        }
    }

    /// Inserts documents and returns them as stored.
    ///
    /// All documents are written in one bulk request, then read back by identifier. The result
    /// order follows the store, not `values`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchLayerError::InvalidDocument`] for a document that cannot be prepared,
    /// or [`SearchLayerError::Store`] when the request or any of its items fails. Items written
    /// before a failed one are not rolled back.
    pub async fn insert(&self, values: Vec<Record>) -> SearchLayerResult<Vec<Record>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let documents = values
            .iter()
            .map(|value| {
                prepare_document(self.schema(), value)
                    .map(|prepared| IndexDocument { id: prepared.id, source: prepared.body })
            })
            .collect::<SearchLayerResult<Vec<_>>>()?;

        let response = self
            .client
            .bulk_index(&self.index, self.identity(), documents)
            .await?;

        if let Some(item) = response.first_error() {
            tracing::warn!(type_name = %self.identity(), id = ?item.id, error = ?item.error, "bulk index item failed");

            return Err(SearchLayerError::Store(format!(
                "failed to index document {}: {}",
                item.id.as_deref().unwrap_or("<generated>"),
                item.error.as_deref().unwrap_or_default()
            )));
        }

        self.fetch(response.ids()).await
    }

    /// Inserts one document and returns it as stored.
    ///
    /// # Errors
    ///
    /// See [`Collection::insert`]. Returns [`SearchLayerError::NotFound`] when the written
    /// document cannot be read back.
    pub async fn insert_one(&self, value: Record) -> SearchLayerResult<Record> {
        self.insert(vec![value])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SearchLayerError::NotFound(self.identity().to_string()))
    }

    /// Applies `values` to every document matching `criteria` and returns them as stored.
    ///
    /// The match set is resolved by a search (never the identifier fast path), then each match
    /// receives a partial update; identifier fields in `values` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SearchLayerError::InvalidDocument`] before any store call when `values` cannot
    /// be prepared, [`SearchLayerError::NotFound`] without issuing any update when the store
    /// reports no hits container, or the first failure of the update batch.
    pub async fn update(&self, criteria: &Criteria, values: Record) -> SearchLayerResult<Vec<Record>> {
        let partial = prepare_document(self.schema(), &values)?.body;
        let query = self
            .compile(criteria)?
            .with_default_size(self.options.match_limit)
            .without_source();

        let response = self
            .client
            .search(&self.index, self.identity(), &query)
            .await?;

        if response.hits.is_none() {
            return Err(SearchLayerError::NotFound(self.identity().to_string()));
        }

        let ids = self
            .update_batch(response.ids(), partial)
            .await
            .into_result()?;

        self.fetch(ids).await
    }

    /// Issues one partial update per identifier, at most
    /// [`CollectionOptions::update_concurrency`] at a time.
    ///
    /// The batch stops starting updates at the first failure; updates already completed are
    /// reported in [`UpdateBatch::completed`].
    pub async fn update_batch(&self, ids: Vec<String>, partial: Record) -> UpdateBatch {
        let client = self.client;
        let index = self.index.as_str();
        let type_name = self.identity();
        let partial = &partial;

        let mut updates = stream::iter(ids)
            .map(|id| async move {
                client
                    .update(index, type_name, &id, partial.clone())
                    .await
                    .map(|_| id)
            })
            .buffer_unordered(self.options.update_concurrency.max(1));

        let mut batch = UpdateBatch::default();

        while let Some(result) = updates.next().await {
            match result {
                Ok(id) => batch.completed.push(id),
                Err(err) => {
                    tracing::warn!(type_name = %type_name, completed = batch.completed.len(), "update batch aborted");
                    batch.failure = Some(err);
                    break;
                }
            }
        }

        batch
    }

    /// Deletes every document matching `criteria` and returns their identifiers as `[{id}]`.
    ///
    /// For an identifier lookup the identifiers are captured with a multi-get, otherwise with a
    /// search; the delete then runs by filter. Capture and delete are two requests, so a
    /// document written in between may be deleted without being reported.
    ///
    /// # Errors
    ///
    /// Returns compilation errors before any store call, or the client's
    /// [`SearchLayerError::Store`].
    pub async fn destroy(&self, criteria: &Criteria) -> SearchLayerResult<Vec<Record>> {
        let query = self.compile(criteria)?;

        let ids = match criteria.id_lookup() {
            Some(ids) if ids.is_empty() => return Ok(Vec::new()),
            Some(ids) => self
                .client
                .multi_get(&self.index, self.identity(), ids)
                .await?
                .into_iter()
                .filter(|item| item.found)
                .map(|item| item.id)
                .collect::<Vec<_>>(),
            None => self
                .client
                .search(
                    &self.index,
                    self.identity(),
                    &query
                        .clone()
                        .with_default_size(self.options.match_limit)
                        .without_source(),
                )
                .await?
                .ids(),
        };

        self.client
            .delete_by_query(&self.index, self.identity(), &query)
            .await?;

        tracing::debug!(type_name = %self.identity(), destroyed = ids.len(), "destroy completed");

        Ok(ids
            .into_iter()
            .map(|id| Record::from_iter([(ID_FIELD.to_string(), Value::String(id))]))
            .collect())
    }

    /// Counts the documents matching `criteria`.
    ///
    /// # Errors
    ///
    /// Returns compilation errors before any store call, or the client's
    /// [`SearchLayerError::Store`].
    pub async fn count(&self, criteria: &Criteria) -> SearchLayerResult<u64> {
        let query = self.compile(criteria)?;

        self.client
            .count(&self.index, self.identity(), &query)
            .await
    }

    /// Sends caller-supplied bulk operations to the store as they are.
    ///
    /// # Errors
    ///
    /// Returns the client's [`SearchLayerError::Store`].
    pub async fn bulk(&self, operations: Vec<BulkOperation>) -> SearchLayerResult<BulkResponse> {
        self.client
            .bulk(&self.index, self.identity(), operations)
            .await
    }

    /// Sends a search body in the store's own query language and returns the raw response.
    ///
    /// Nothing is compiled, coerced or hydrated; hits keep the store identifier.
    ///
    /// # Errors
    ///
    /// Returns the client's [`SearchLayerError::Store`].
    pub async fn search_raw(&self, body: Value) -> SearchLayerResult<SearchResponse> {
        self.client
            .raw_search(&self.index, self.identity(), body)
            .await
    }

    /// Fetches one page of the documents matching `criteria`.
    ///
    /// Any `limit`/`skip` in `criteria` is replaced by the page window. Identifier lookups
    /// are answered by a multi-get, so their window is applied to the fetched documents.
    ///
    /// # Errors
    ///
    /// See [`Collection::count`] and [`Collection::find`].
    pub async fn paginate(
        &self,
        criteria: &Criteria,
        params: PaginationParams,
    ) -> SearchLayerResult<Page<Record>> {
        let count = self.count(criteria).await?;
        let mut documents = self
            .find(&params.window(criteria.clone()))
            .await?
            .into_documents();

        if criteria.id_lookup().is_some() {
            documents = documents
                .into_iter()
                .skip(params.offset() as usize)
                .take(params.per_page as usize)
                .collect();
        }

        Ok(params.page(documents, count))
    }

    async fn fetch(&self, ids: Vec<String>) -> SearchLayerResult<Vec<Record>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .client
            .multi_get(&self.index, self.identity(), ids)
            .await?
            .into_iter()
            .filter(|item| item.found)
            .map(|item| hydrate(&item.id, item.source.unwrap_or_default()))
            .collect())
    }
}

/// A collection exchanging values of the model `M`.
#[derive(Debug)]
pub struct TypedCollection<'a, C: StoreClient, M: Model> {
    inner: Collection<'a, C>,
    _marker: PhantomData<M>,
}

impl<'a, C: StoreClient, M: Model> TypedCollection<'a, C, M> {
    pub(crate) fn new(inner: Collection<'a, C>) -> Self {
        Self { inner, _marker: PhantomData }
    }

    /// The underlying untyped collection.
    pub fn untyped(&self) -> &Collection<'a, C> {
        &self.inner
    }

    pub fn with_options(self, options: CollectionOptions) -> Self {
        Self::new(self.inner.with_options(options))
    }

    pub async fn find(&self, criteria: &Criteria) -> SearchLayerResult<Vec<M>> {
        self.inner
            .find(criteria)
            .await?
            .into_documents()
            .into_iter()
            .map(M::from_record)
            .collect()
    }

    pub async fn insert(&self, models: Vec<M>) -> SearchLayerResult<Vec<M>> {
        let records = models
            .iter()
            .map(ModelExt::to_record)
            .collect::<SearchLayerResult<Vec<_>>>()?;

        self.inner
            .insert(records)
            .await?
            .into_iter()
            .map(M::from_record)
            .collect()
    }

    pub async fn insert_one(&self, model: &M) -> SearchLayerResult<M> {
        M::from_record(self.inner.insert_one(model.to_record()?).await?)
    }

    /// Applies the partial `values` to every match of `criteria`.
    pub async fn update(&self, criteria: &Criteria, values: Record) -> SearchLayerResult<Vec<M>> {
        self.inner
            .update(criteria, values)
            .await?
            .into_iter()
            .map(M::from_record)
            .collect()
    }

    /// Deletes every match of `criteria` and returns the deleted identifiers.
    pub async fn destroy(&self, criteria: &Criteria) -> SearchLayerResult<Vec<String>> {
        Ok(self
            .inner
            .destroy(criteria)
            .await?
            .into_iter()
            .filter_map(|mut record| match record.remove(ID_FIELD) {
                Some(Value::String(id)) => Some(id),
                _ => None,
            })
            .collect())
    }

    pub async fn count(&self, criteria: &Criteria) -> SearchLayerResult<u64> {
        self.inner.count(criteria).await
    }

    pub async fn paginate(&self, criteria: &Criteria, params: PaginationParams) -> SearchLayerResult<Page<M>> {
        self.inner
            .paginate(criteria, params)
            .await?
            .try_map(M::from_record)
    }
}
