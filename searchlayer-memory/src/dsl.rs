//! Reading raw search bodies written in the Elasticsearch filter DSL.
//!
//! Only the subset that maps onto a [`NativeFilter`] is understood: `match_all`, `term`,
//! `terms`, `ids`, `range`, `not`, `and`, `or` and `bool`, inside a `filtered` or plain query.
//! Anything else is rejected with [`SearchLayerError::Store`].

use serde_json::{Map, Value};

use searchlayer_core::{
    compiler::CompiledQuery,
    criteria::{Sort, SortDirection},
    error::{SearchLayerError, SearchLayerResult},
    native::{NativeFilter, RangeBound},
};

fn unsupported(what: impl std::fmt::Display) -> SearchLayerError {
    SearchLayerError::Store(format!("in-memory raw search does not support {what}"))
}

/// Reads a raw search body into a query scoped to `type_name`.
pub(crate) fn parse_search_body(type_name: &str, body: &Value) -> SearchLayerResult<CompiledQuery> {
    let Value::Object(body) = body else {
        return Err(unsupported("a non-object body"));
    };

    let mut query = CompiledQuery::match_all(type_name);
    let mut filters = Vec::new();

    for (key, value) in body {
        match key.as_str() {
            "query" => filters.push(parse_query(value)?),
            "filter" | "post_filter" => filters.push(parse_filter(value)?),
            "size" => query.size = Some(parse_count(key, value)?),
            "from" => query.from = Some(parse_count(key, value)?),
            "sort" => query.sort = parse_sort(value)?,
            "_source" => match value {
                Value::Bool(fetch_source) => query.fetch_source = *fetch_source,
                _ => return Err(unsupported("source filtering")),
            },
            other => return Err(unsupported(format!("`{other}`"))),
        }
    }

    query.filter = NativeFilter::all(filters);

    Ok(query)
}

fn parse_count(key: &str, value: &Value) -> SearchLayerResult<u64> {
    value
        .as_u64()
        .ok_or_else(|| unsupported(format!("a non-numeric `{key}`")))
}

/// Splits `{operator: body}` into its only entry.
fn single_entry<'a>(value: &'a Value, context: &str) -> SearchLayerResult<(&'a str, &'a Value)> {
    match value {
        Value::Object(map) if map.len() == 1 => match map.iter().next() {
            Some((key, body)) => Ok((key.as_str(), body)),
            None => Err(unsupported(format!("an empty {context}"))),
        },
        _ => Err(unsupported(format!("{context} {value}"))),
    }
}

fn parse_query(value: &Value) -> SearchLayerResult<NativeFilter> {
    let (operator, body) = single_entry(value, "query")?;

    match operator {
        "filtered" => {
            let Value::Object(filtered) = body else {
                return Err(unsupported("a non-object filtered query"));
            };

            let mut filters = Vec::new();
            for (key, value) in filtered {
                match key.as_str() {
                    "filter" => filters.push(parse_filter(value)?),
                    "query" => filters.push(parse_query(value)?),
                    other => return Err(unsupported(format!("`{other}` in a filtered query"))),
                }
            }

            Ok(NativeFilter::all(filters))
        }
        "constant_score" => match body.get("filter") {
            Some(filter) => parse_filter(filter),
            None => Err(unsupported("a constant_score query without filter")),
        },
        _ => parse_filter(value),
    }
}

fn parse_filter(value: &Value) -> SearchLayerResult<NativeFilter> {
    let (operator, body) = single_entry(value, "filter")?;

    match operator {
        "match_all" => Ok(NativeFilter::MatchAll),
        "term" => {
            let (field, value) = single_entry(body, "term filter")?;
            let value = match value {
                Value::Object(term) => term
                    .get("value")
                    .cloned()
                    .ok_or_else(|| unsupported("a term filter without value"))?,
                value => value.clone(),
            };

            Ok(NativeFilter::Term { field: field.to_string(), value })
        }
        "terms" => match single_entry(body, "terms filter")? {
            (field, Value::Array(values)) => Ok(NativeFilter::Terms {
                field: field.to_string(),
                values: values.clone(),
            }),
            (field, _) => Err(unsupported(format!("a terms filter on `{field}` without a list"))),
        },
        "ids" => match body.get("values") {
            Some(Value::Array(values)) => Ok(NativeFilter::Ids {
                values: values.clone(),
                type_name: body
                    .get("type")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            _ => Err(unsupported("an ids filter without values")),
        },
        "range" => {
            let (field, bounds) = single_entry(body, "range filter")?;
            let Value::Object(bounds) = bounds else {
                return Err(unsupported(format!("a range filter on `{field}` without bounds")));
            };

            Ok(NativeFilter::Range {
                field: field.to_string(),
                bounds: bounds
                    .iter()
                    .map(|(bound, value)| Ok((parse_bound(bound)?, value.clone())))
                    .collect::<SearchLayerResult<Vec<_>>>()?,
            })
        }
        "not" => {
            let inner = body.get("filter").unwrap_or(body);

            Ok(NativeFilter::Not(Box::new(parse_filter(inner)?)))
        }
        "and" => Ok(NativeFilter::And(parse_filter_list(body)?)),
        "or" => Ok(NativeFilter::Or(parse_filter_list(body)?)),
        "bool" => match body {
            Value::Object(clauses) => parse_bool(clauses),
            _ => Err(unsupported("a non-object bool filter")),
        },
        other => Err(unsupported(format!("the `{other}` filter"))),
    }
}

fn parse_filter_list(value: &Value) -> SearchLayerResult<Vec<NativeFilter>> {
    let filters = match value {
        Value::Object(map) => map.get("filters").unwrap_or(value),
        _ => value,
    };

    match filters {
        Value::Array(filters) => filters.iter().map(parse_filter).collect(),
        filter => Ok(vec![parse_filter(filter)?]),
    }
}

fn parse_bool(clauses: &Map<String, Value>) -> SearchLayerResult<NativeFilter> {
    let mut filters = Vec::new();

    for (occurrence, value) in clauses {
        if !matches!(occurrence.as_str(), "must" | "filter" | "must_not" | "should") {
            return Err(unsupported(format!("`{occurrence}` in a bool filter")));
        }
        let parsed = parse_filter_list(value)?;

        match occurrence.as_str() {
            "must" | "filter" => filters.extend(parsed),
            "must_not" => filters.extend(
                parsed
                    .into_iter()
                    .map(|filter| NativeFilter::Not(Box::new(filter))),
            ),
            "should" if !parsed.is_empty() => filters.push(NativeFilter::Or(parsed)),
            _ => {}
        }
    }

    Ok(NativeFilter::all(filters))
}

fn parse_bound(bound: &str) -> SearchLayerResult<RangeBound> {
    match bound {
        "gt" => Ok(RangeBound::Gt),
        "gte" => Ok(RangeBound::Gte),
        "lt" => Ok(RangeBound::Lt),
        "lte" => Ok(RangeBound::Lte),
        other => Err(unsupported(format!("the `{other}` range bound"))),
    }
}

fn parse_direction(value: &Value) -> SearchLayerResult<SortDirection> {
    let order = match value {
        Value::Object(options) => options.get("order").and_then(Value::as_str),
        value => value.as_str(),
    };

    match order {
        Some("desc") => Ok(SortDirection::Desc),
        Some("asc") | None => Ok(SortDirection::Asc),
        Some(other) => Err(unsupported(format!("the `{other}` sort order"))),
    }
}

fn parse_sort(value: &Value) -> SearchLayerResult<Vec<Sort>> {
    let keys: Vec<&Value> = match value {
        Value::Array(keys) => keys.iter().collect(),
        key => vec![key],
    };

    let mut sort = Vec::new();
    for key in keys {
        match key {
            Value::String(field) => sort.push(Sort { field: field.clone(), direction: SortDirection::Asc }),
            Value::Object(fields) => {
                for (field, order) in fields {
                    sort.push(Sort { field: field.clone(), direction: parse_direction(order)? });
                }
            }
            other => return Err(unsupported(format!("the sort key {other}"))),
        }
    }

    Ok(sort)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filtered_body() {
        let query = parse_search_body(
            "ticket",
            &json!({
                "query": { "filtered": { "filter": { "and": [
                    { "term": { "status": "open" } },
                    { "not": { "range": { "priority": { "lt": 3 } } } }
                ] } } },
                "size": 2,
                "from": 1,
                "sort": [{ "priority": { "order": "desc" } }, "title"],
                "_source": false
            }),
        )
        .unwrap();

        assert_eq!(
            query.filter,
            NativeFilter::And(vec![
                NativeFilter::Term { field: "status".to_string(), value: json!("open") },
                NativeFilter::Not(Box::new(NativeFilter::Range {
                    field: "priority".to_string(),
                    bounds: vec![(RangeBound::Lt, json!(3))],
                })),
            ])
        );
        assert_eq!(query.size, Some(2));
        assert_eq!(query.from, Some(1));
        assert_eq!(
            query.sort,
            vec![
                Sort { field: "priority".to_string(), direction: SortDirection::Desc },
                Sort { field: "title".to_string(), direction: SortDirection::Asc },
            ]
        );
        assert!(!query.fetch_source);
    }

    #[test]
    fn test_bool_and_ids() {
        let query = parse_search_body(
            "ticket",
            &json!({ "query": { "bool": {
                "must": { "ids": { "values": ["a", "b"] } },
                "must_not": [{ "term": { "status": { "value": "closed" } } }]
            } } }),
        )
        .unwrap();

        assert_eq!(
            query.filter,
            NativeFilter::And(vec![
                NativeFilter::Ids { values: vec![json!("a"), json!("b")], type_name: None },
                NativeFilter::Not(Box::new(NativeFilter::Term {
                    field: "status".to_string(),
                    value: json!("closed"),
                })),
            ])
        );
    }

    #[test]
    fn test_empty_body_matches_everything() {
        assert!(parse_search_body("ticket", &json!({})).unwrap().filter.is_match_all());
    }

    #[test]
    fn test_unsupported_bodies_are_rejected() {
        for body in [
            json!([]),
            json!({ "aggs": {} }),
            json!({ "query": { "match": { "title": "fire" } } }),
            json!({ "query": { "regexp": { "title": { "value": "f.*" } } } }),
            json!({ "query": { "range": { "priority": { "between": 1 } } } }),
        ] {
            assert!(matches!(
                parse_search_body("ticket", &body),
                Err(SearchLayerError::Store(_))
            ));
        }
    }
}
