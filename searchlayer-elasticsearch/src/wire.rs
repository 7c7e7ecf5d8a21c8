//! Request and response bodies of the Elasticsearch HTTP API.

use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::HashMap;

use searchlayer_core::{
    client::{BulkItem, BulkOperation, BulkResponse, Hit, Hits, MultiGetItem, SearchResponse},
    document::Record,
    error::{SearchLayerError, SearchLayerResult},
};

#[derive(Debug, Deserialize)]
pub(crate) struct MultiGetBody {
    #[serde(default)]
    docs: Vec<MultiGetDoc>,
}

#[derive(Debug, Deserialize)]
struct MultiGetDoc {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source")]
    source: Option<Record>,
}

impl MultiGetBody {
    pub(crate) fn into_items(self) -> Vec<MultiGetItem> {
        self.docs
            .into_iter()
            .map(|doc| MultiGetItem { id: doc.id, found: doc.found, source: doc.source })
            .collect()
    }
}

/// Totals are a plain number on older clusters and `{ "value": n }` on newer ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Total {
    Plain(u64),
    Object { value: u64 },
}

#[derive(Debug, Deserialize)]
struct HitsBody {
    total: Total,
    #[serde(default)]
    hits: Vec<HitBody>,
}

#[derive(Debug, Deserialize)]
struct HitBody {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source")]
    source: Option<Record>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchBody {
    hits: Option<HitsBody>,
    aggregations: Option<Value>,
    facets: Option<Value>,
}

impl SearchBody {
    pub(crate) fn into_response(self) -> SearchResponse {
        SearchResponse {
            hits: self.hits.map(|hits| Hits {
                total: match hits.total {
                    Total::Plain(total) | Total::Object { value: total } => total,
                },
                hits: hits
                    .hits
                    .into_iter()
                    .map(|hit| Hit { id: hit.id, source: hit.source })
                    .collect(),
            }),
            aggregations: self.aggregations,
            facets: self.facets,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CountBody {
    pub(crate) count: u64,
}

#[derive(Debug, Deserialize)]
struct BulkItemBody {
    #[serde(rename = "_id")]
    id: Option<String>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkBody {
    #[serde(default)]
    items: Vec<HashMap<String, BulkItemBody>>,
}

fn describe_error(error: Value) -> String {
    match &error {
        Value::String(message) => message.clone(),
        Value::Object(details) => match (details.get("type"), details.get("reason")) {
            (Some(Value::String(kind)), Some(Value::String(reason))) => format!("{kind}: {reason}"),
            _ => error.to_string(),
        },
        _ => error.to_string(),
    }
}

impl BulkBody {
    pub(crate) fn into_response(self) -> BulkResponse {
        BulkResponse {
            items: self
                .items
                .into_iter()
                .filter_map(|item| item.into_values().next())
                .map(|item| BulkItem { id: item.id, error: item.error.map(describe_error) })
                .collect(),
        }
    }
}

fn action(name: &str, id: Option<&str>) -> Value {
    let mut metadata = Map::new();

    if let Some(id) = id {
        metadata.insert("_id".to_string(), Value::String(id.to_string()));
    }

    let mut action = Map::new();
    action.insert(name.to_string(), Value::Object(metadata));

    Value::Object(action)
}

/// Renders bulk operations as newline-delimited JSON, one action line followed by its payload
/// line where the action takes one.
pub(crate) fn bulk_lines(operations: &[BulkOperation]) -> SearchLayerResult<String> {
    let mut lines = Vec::with_capacity(operations.len() * 2);

    for operation in operations {
        match operation {
            BulkOperation::Index { id, source } => {
                lines.push(action("index", id.as_deref()));
                lines.push(Value::Object(source.clone()));
            }
            BulkOperation::Create { id, source } => {
                lines.push(action("create", id.as_deref()));
                lines.push(Value::Object(source.clone()));
            }
            BulkOperation::Update { id, partial } => {
                lines.push(action("update", Some(id)));
                lines.push(json!({ "doc": partial }));
            }
            BulkOperation::Delete { id } => lines.push(action("delete", Some(id))),
        }
    }

    let mut body = String::new();

    for line in lines {
        body.push_str(
            &serde_json::to_string(&line).map_err(|e| SearchLayerError::Serialization(e.to_string()))?,
        );
        body.push('\n');
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_get_body() {
        let body: MultiGetBody = serde_json::from_value(json!({
            "docs": [
                { "_id": "a", "found": true, "_source": { "title": "x" } },
                { "_id": "b", "found": false }
            ]
        }))
        .unwrap();

        let items = body.into_items();

        assert!(items[0].found);
        assert_eq!(items[0].source.as_ref().and_then(|source| source.get("title")), Some(&json!("x")));
        assert!(!items[1].found);
        assert_eq!(items[1].source, None);
    }

    #[test]
    fn test_search_body_totals() {
        let legacy: SearchBody = serde_json::from_value(json!({
            "hits": { "total": 3, "hits": [{ "_id": "a", "_source": {} }] },
            "aggregations": { "sum_priority": { "value": 6.0 } }
        }))
        .unwrap();
        let current: SearchBody = serde_json::from_value(json!({
            "hits": { "total": { "value": 7, "relation": "eq" }, "hits": [{ "_id": "b" }] }
        }))
        .unwrap();

        let legacy = legacy.into_response();
        let current = current.into_response();

        assert_eq!(legacy.hits.as_ref().map(|hits| hits.total), Some(3));
        assert!(legacy.aggregations.is_some());
        assert_eq!(current.hits.as_ref().map(|hits| hits.total), Some(7));
        assert_eq!(current.hits.unwrap().hits[0].source, None);
    }

    #[test]
    fn test_bulk_body_errors() {
        let body: BulkBody = serde_json::from_value(json!({
            "items": [
                { "index": { "_id": "a", "status": 201 } },
                { "create": { "_id": "b", "status": 409, "error": { "type": "version_conflict", "reason": "exists" } } },
                { "delete": { "_id": "c", "status": 404, "error": "DocumentMissingException" } }
            ]
        }))
        .unwrap();

        let response = body.into_response();

        assert_eq!(response.ids(), vec!["a".to_string()]);
        assert_eq!(response.items[1].error.as_deref(), Some("version_conflict: exists"));
        assert_eq!(response.items[2].error.as_deref(), Some("DocumentMissingException"));
    }

    #[test]
    fn test_bulk_lines() {
        let Value::Object(source) = json!({ "title": "x" }) else { unreachable!() };

        let body = bulk_lines(&[
            BulkOperation::Index { id: None, source: source.clone() },
            BulkOperation::Update { id: "a".to_string(), partial: source },
            BulkOperation::Delete { id: "b".to_string() },
        ])
        .unwrap();

        assert_eq!(
            body,
            concat!(
                "{\"index\":{}}\n",
                "{\"title\":\"x\"}\n",
                "{\"update\":{\"_id\":\"a\"}}\n",
                "{\"doc\":{\"title\":\"x\"}}\n",
                "{\"delete\":{\"_id\":\"b\"}}\n",
            )
        );
    }
}
