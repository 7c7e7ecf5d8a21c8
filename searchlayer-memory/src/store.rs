//! In-memory store client.
//!
//! This module provides a search store that keeps records in nested maps behind async-safe
//! read-write locks and evaluates compiled queries itself.

use async_trait::async_trait;
use mea::rwlock::RwLock;
use serde_json::{Map, Value, json};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use uuid::Uuid;

use searchlayer_core::{
    client::{
        BulkItem, BulkOperation, BulkResponse, Hit, Hits, MultiGetItem, SearchResponse, StoreClient,
        StoreClientBuilder,
    },
    compiler::{Aggregation, CompiledQuery, Metric},
    criteria::{Sort, SortDirection},
    document::Record,
    error::{SearchLayerError, SearchLayerResult},
    schema::INTERNAL_ID_FIELD,
};

use crate::{
    dsl::parse_search_body,
    evaluator::{Comparable, RecordEvaluator, lookup},
};

/// Number of hits returned by a search that sets no size.
pub const DEFAULT_SEARCH_SIZE: u64 = 10;

type TypeMap = BTreeMap<String, Record>;
type IndexMap = HashMap<String, TypeMap>;
type StoreMap = HashMap<String, IndexMap>;

/// Thread-safe in-memory search store.
///
/// Records are kept per index and type, keyed by identifier. Searches scan every record of the
/// type (no indexing) and behave like a search store in the ways the orchestrator relies on:
/// a search without size returns at most [`DEFAULT_SEARCH_SIZE`] hits, and multi-get reports
/// missing identifiers as not found.
///
/// # Thread Safety
///
/// `InMemoryClient` is cloneable and uses an `Arc`-wrapped internal state. Multiple clones of
/// the same instance share the same underlying data.
///
/// # Example
///
/// ```ignore
/// use searchlayer_memory::InMemoryClient;
/// use searchlayer_core::store::SearchStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = SearchStore::new(InMemoryClient::new(), "app");
///     let tickets = store.collection(definition);
///
///     tickets.insert(vec![ticket]).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryClient {
    /// index -> (type -> (id -> record))
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryClient {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    pub fn builder() -> InMemoryClientBuilder {
        InMemoryClientBuilder::default()
    }
}

fn sort_records(records: &mut [(&String, &Record)], sort: &[Sort]) {
    records.sort_by(|(left_id, left), (right_id, right)| {
        for key in sort {
            let (left, right) = if key.field == INTERNAL_ID_FIELD {
                (Comparable::String(left_id), Comparable::String(right_id))
            } else {
                (
                    lookup(left, &key.field).map(Comparable::from).unwrap_or(Comparable::Null),
                    lookup(right, &key.field).map(Comparable::from).unwrap_or(Comparable::Null),
                )
            };

            let ordering = match key.direction {
                SortDirection::Asc => left.partial_cmp(&right),
                SortDirection::Desc => right.partial_cmp(&left),
            }
            .unwrap_or(Ordering::Equal);

            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    });
}

fn aggregate(records: &[(&String, &Record)], aggregations: &[Aggregation]) -> Value {
    let mut results = Map::new();

    for aggregation in aggregations {
        let values: Vec<f64> = records
            .iter()
            .filter_map(|(_, record)| lookup(record, &aggregation.field))
            .filter_map(Value::as_f64)
            .collect();

        let value = match aggregation.metric {
            Metric::Sum => Some(values.iter().sum::<f64>()),
            Metric::Avg if values.is_empty() => None,
            Metric::Avg => Some(values.iter().sum::<f64>() / values.len() as f64),
            Metric::Min => values.iter().copied().reduce(f64::min),
            Metric::Max => values.iter().copied().reduce(f64::max),
        };

        results.insert(aggregation.name.clone(), json!({ "value": value }));
    }

    Value::Object(results)
}

/// Merges `partial` into `target`, descending into nested objects.
fn merge(target: &mut Record, partial: Record) {
    for (key, value) in partial {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => merge(existing, nested),
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

#[async_trait]
impl StoreClient for InMemoryClient {
    async fn multi_get(
        &self,
        index: &str,
        type_name: &str,
        ids: Vec<String>,
    ) -> SearchLayerResult<Vec<MultiGetItem>> {
        let store = self.store.read().await;
        let records = store
            .get(index)
            .and_then(|types| types.get(type_name));

        Ok(ids
            .into_iter()
            .map(|id| {
                let source = records.and_then(|records| records.get(&id)).cloned();

                MultiGetItem { found: source.is_some(), id, source }
            })
            .collect())
    }

    async fn search(
        &self,
        index: &str,
        type_name: &str,
        query: &CompiledQuery,
    ) -> SearchLayerResult<SearchResponse> {
        let store = self.store.read().await;
        let empty = TypeMap::new();
        let records = store
            .get(index)
            .and_then(|types| types.get(type_name))
            .unwrap_or(&empty);

        let mut matched = RecordEvaluator::filter_records(records, &query.filter)?;
        sort_records(&mut matched, &query.sort);

        let aggregations = query
            .aggregations
            .as_ref()
            .map(|aggregations| aggregate(&matched, aggregations));

        if query.facets.is_some() {
            tracing::warn!(type_name, "in-memory search ignores facets");
        }

        let total = matched.len() as u64;
        let hits = matched
            .into_iter()
            .skip(query.from.unwrap_or(0) as usize)
            .take(query.size.unwrap_or(DEFAULT_SEARCH_SIZE) as usize)
            .map(|(id, record)| Hit {
                id: id.clone(),
                source: query.fetch_source.then(|| record.clone()),
            })
            .collect();

        Ok(SearchResponse {
            hits: Some(Hits { total, hits }),
            aggregations,
            facets: None,
        })
    }

    /// Accepts the filter subset of the Elasticsearch search DSL; bodies using anything else,
    /// such as full-text queries or aggregations, fail with [`SearchLayerError::Store`].
    async fn raw_search(
        &self,
        index: &str,
        type_name: &str,
        body: Value,
    ) -> SearchLayerResult<SearchResponse> {
        let query = parse_search_body(type_name, &body)?;

        self.search(index, type_name, &query).await
    }

    async fn update(
        &self,
        index: &str,
        type_name: &str,
        id: &str,
        partial: Record,
    ) -> SearchLayerResult<()> {
        let mut store = self.store.write().await;
        let record = store
            .get_mut(index)
            .and_then(|types| types.get_mut(type_name))
            .and_then(|records| records.get_mut(id))
            .ok_or_else(|| {
                SearchLayerError::Store(format!("document missing: [{type_name}][{id}]"))
            })?;

        merge(record, partial);

        Ok(())
    }

    async fn delete_by_query(
        &self,
        index: &str,
        type_name: &str,
        query: &CompiledQuery,
    ) -> SearchLayerResult<()> {
        let mut store = self.store.write().await;
        let Some(records) = store
            .get_mut(index)
            .and_then(|types| types.get_mut(type_name))
        else {
            return Ok(());
        };

        let ids: Vec<String> = RecordEvaluator::filter_records(records.iter(), &query.filter)?
            .into_iter()
            .map(|(id, _)| id.clone())
            .collect();

        for id in &ids {
            records.remove(id);
        }

        tracing::debug!(type_name, deleted = ids.len(), "deleted by query");

        Ok(())
    }

    async fn count(
        &self,
        index: &str,
        type_name: &str,
        query: &CompiledQuery,
    ) -> SearchLayerResult<u64> {
        let store = self.store.read().await;

        match store
            .get(index)
            .and_then(|types| types.get(type_name))
        {
            Some(records) => Ok(RecordEvaluator::filter_records(records, &query.filter)?.len() as u64),
            None => Ok(0),
        }
    }

    async fn bulk(
        &self,
        index: &str,
        type_name: &str,
        operations: Vec<BulkOperation>,
    ) -> SearchLayerResult<BulkResponse> {
        let mut store = self.store.write().await;
        let records = store
            .entry(index.to_string())
            .or_default()
            .entry(type_name.to_string())
            .or_default();

        let items = operations
            .into_iter()
            .map(|operation| match operation {
                BulkOperation::Index { id, source } => {
                    let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
                    records.insert(id.clone(), source);

                    BulkItem { id: Some(id), error: None }
                }
                BulkOperation::Create { id, source } => {
                    let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());

                    if records.contains_key(&id) {
                        return BulkItem {
                            error: Some(format!("document already exists: [{type_name}][{id}]")),
                            id: Some(id),
                        };
                    }

                    records.insert(id.clone(), source);
                    BulkItem { id: Some(id), error: None }
                }
                BulkOperation::Update { id, partial } => match records.get_mut(&id) {
                    Some(record) => {
                        merge(record, partial);
                        BulkItem { id: Some(id), error: None }
                    }
                    None => BulkItem {
                        error: Some(format!("document missing: [{type_name}][{id}]")),
                        id: Some(id),
                    },
                },
                BulkOperation::Delete { id } => {
                    records.remove(&id);
                    BulkItem { id: Some(id), error: None }
                }
            })
            .collect();

        Ok(BulkResponse { items })
    }
}

/// Builder for constructing [`InMemoryClient`] instances.
///
/// ```ignore
/// use searchlayer_memory::InMemoryClient;
/// use searchlayer_core::client::StoreClientBuilder;
///
/// let client = InMemoryClient::builder().build().await?;
/// ```
#[derive(Default)]
pub struct InMemoryClientBuilder;

#[async_trait]
impl StoreClientBuilder for InMemoryClientBuilder {
    type Client = InMemoryClient;

    async fn build(self) -> SearchLayerResult<Self::Client> {
        Ok(InMemoryClient::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchlayer_core::{
        client::IndexDocument,
        compiler::compile_value,
        schema::Schema,
    };

    fn record(value: Value) -> Record {
        let Value::Object(record) = value else { unreachable!() };
        record
    }

    fn query(criteria: Value) -> CompiledQuery {
        compile_value(criteria, &Schema::new(), "ticket").unwrap()
    }

    async fn seeded() -> InMemoryClient {
        let client = InMemoryClient::builder().build().await.unwrap();

        client
            .bulk_index(
                "app",
                "ticket",
                vec![
                    IndexDocument { id: Some("a".to_string()), source: record(json!({ "priority": 1, "title": "alpha" })) },
                    IndexDocument { id: Some("b".to_string()), source: record(json!({ "priority": 3, "title": "beta" })) },
                    IndexDocument { id: Some("c".to_string()), source: record(json!({ "priority": 2, "title": "gamma" })) },
                ],
            )
            .await
            .unwrap();

        client
    }

    #[tokio::test]
    async fn test_bulk_index_generates_missing_ids() {
        let client = InMemoryClient::new();

        let response = client
            .bulk_index("app", "ticket", vec![IndexDocument { id: None, source: Record::new() }])
            .await
            .unwrap();

        let id = response.items[0].id.clone().unwrap();
        let fetched = client.multi_get("app", "ticket", vec![id, "nope".to_string()]).await.unwrap();

        assert!(fetched[0].found);
        assert!(!fetched[1].found);
    }

    #[tokio::test]
    async fn test_search_sorts_and_windows() {
        let client = seeded().await;

        let response = client
            .search("app", "ticket", &query(json!({ "sort": { "priority": -1 }, "limit": 2, "skip": 1 })))
            .await
            .unwrap();

        let hits = response.hits.unwrap();
        assert_eq!(hits.total, 3);
        assert_eq!(hits.hits.iter().map(|hit| hit.id.as_str()).collect::<Vec<_>>(), vec!["c", "a"]);
    }

    #[tokio::test]
    async fn test_search_without_source() {
        let client = seeded().await;

        let response = client
            .search("app", "ticket", &query(json!({ "where": { "title": "beta" } })).without_source())
            .await
            .unwrap();

        assert_eq!(response.ids(), vec!["b".to_string()]);
        assert_eq!(response.hits.unwrap().hits[0].source, None);
    }

    #[tokio::test]
    async fn test_aggregations() {
        let client = seeded().await;

        let response = client
            .search("app", "ticket", &query(json!({ "sum": ["priority"], "average": ["priority"], "max": ["missing"] })))
            .await
            .unwrap();

        assert_eq!(
            response.aggregations,
            Some(json!({
                "sum_priority": { "value": 6.0 },
                "avg_priority": { "value": 2.0 },
                "max_missing": { "value": null }
            }))
        );
    }

    #[tokio::test]
    async fn test_update_merges_partial_documents() {
        let client = seeded().await;

        client
            .update("app", "ticket", "a", record(json!({ "title": "omega", "meta": { "seen": true } })))
            .await
            .unwrap();

        let fetched = client.multi_get("app", "ticket", vec!["a".to_string()]).await.unwrap();
        assert_eq!(
            fetched[0].source,
            Some(record(json!({ "priority": 1, "title": "omega", "meta": { "seen": true } })))
        );

        assert!(matches!(
            client.update("app", "ticket", "zzz", Record::new()).await,
            Err(SearchLayerError::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_by_query_and_count() {
        let client = seeded().await;

        client
            .delete_by_query("app", "ticket", &query(json!({ "where": { "priority": { ">=": 2 } } })))
            .await
            .unwrap();

        assert_eq!(client.count("app", "ticket", &query(json!({}))).await.unwrap(), 1);
        assert_eq!(client.count("app", "other", &query(json!({}))).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bulk_reports_item_errors() {
        let client = seeded().await;

        let response = client
            .bulk(
                "app",
                "ticket",
                vec![
                    BulkOperation::Create { id: Some("a".to_string()), source: Record::new() },
                    BulkOperation::Delete { id: "b".to_string() },
                    BulkOperation::Update { id: "b".to_string(), partial: Record::new() },
                ],
            )
            .await
            .unwrap();

        assert!(response.items[0].error.is_some());
        assert!(response.items[1].error.is_none());
        assert!(response.items[2].error.is_some());
    }

    #[tokio::test]
    async fn test_raw_search_runs_filter_bodies() {
        let client = seeded().await;

        let response = client
            .raw_search(
                "app",
                "ticket",
                json!({
                    "query": { "filtered": { "filter": { "range": { "priority": { "gte": 2 } } } } },
                    "sort": [{ "priority": { "order": "asc" } }]
                }),
            )
            .await
            .unwrap();

        assert_eq!(response.ids(), vec!["c".to_string(), "b".to_string()]);

        assert!(matches!(
            client
                .raw_search("app", "ticket", json!({ "query": { "match": { "title": "beta" } } }))
                .await,
            Err(SearchLayerError::Store(_))
        ));
    }
}
