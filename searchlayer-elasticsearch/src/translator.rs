//! Translation of native filter trees into the Elasticsearch filter DSL.
//!
//! Filters are rendered in the legacy layout understood by the `filtered` query: boolean
//! combinators use the `and`, `or` and `not` filters and identifier lookups carry the
//! document type.

use serde_json::{Map, Value, json};

use searchlayer_core::{
    compiler::CompiledQuery,
    criteria::SortDirection,
    error::SearchLayerError,
    native::{FilterVisitor, NativeFilter, Pattern, RangeBound},
};

/// Translates native filters into Elasticsearch filter objects.
pub(crate) struct FilterTranslator;

impl FilterTranslator {
    fn visit_all(&mut self, filters: &[NativeFilter]) -> Result<Vec<Value>, SearchLayerError> {
        filters
            .iter()
            .map(|filter| self.visit_filter(filter))
            .collect()
    }
}

/// Wraps `body` as `{ key: { field: body } }`.
fn field_filter(key: &str, field: &str, body: Value) -> Value {
    let mut inner = Map::new();
    inner.insert(field.to_string(), body);

    let mut outer = Map::new();
    outer.insert(key.to_string(), Value::Object(inner));

    Value::Object(outer)
}

/// Rewrites every cased letter of a pattern body as a class of both cases, `a` becoming
/// `[aA]`. Escape sequences are copied as they are.
///
/// The legacy regexp filter has no case-insensitive flag.
fn fold_case(body: &str) -> String {
    let mut folded = String::with_capacity(body.len() * 2);
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            folded.push(c);
            if let Some(escaped) = chars.next() {
                folded.push(escaped);
            }
            continue;
        }

        let mut lower = c.to_lowercase();
        let mut upper = c.to_uppercase();
        match (lower.next(), lower.next(), upper.next(), upper.next()) {
            (Some(lower), None, Some(upper), None) if lower != upper => {
                folded.push('[');
                folded.push(lower);
                folded.push(upper);
                folded.push(']');
            }
            _ => folded.push(c),
        }
    }

    folded
}

impl FilterVisitor for FilterTranslator {
    type Output = Value;
    type Error = SearchLayerError;

    fn visit_match_all(&mut self) -> Result<Self::Output, Self::Error> {
        Ok(json!({ "match_all": {} }))
    }

    fn visit_term(&mut self, field: &str, value: &Value) -> Result<Self::Output, Self::Error> {
        Ok(field_filter("term", field, value.clone()))
    }

    fn visit_terms(&mut self, field: &str, values: &[Value]) -> Result<Self::Output, Self::Error> {
        Ok(field_filter("terms", field, Value::Array(values.to_vec())))
    }

    fn visit_ids(&mut self, values: &[Value], type_name: Option<&str>) -> Result<Self::Output, Self::Error> {
        let mut ids = Map::new();
        ids.insert("values".to_string(), Value::Array(values.to_vec()));

        if let Some(type_name) = type_name {
            ids.insert("type".to_string(), Value::String(type_name.to_string()));
        }

        Ok(json!({ "ids": ids }))
    }

    fn visit_range(&mut self, field: &str, bounds: &[(RangeBound, Value)]) -> Result<Self::Output, Self::Error> {
        Ok(field_filter(
            "range",
            field,
            Value::Object(
                bounds
                    .iter()
                    .map(|(bound, value)| (bound.as_str().to_string(), value.clone()))
                    .collect(),
            ),
        ))
    }

    fn visit_regexp(&mut self, field: &str, pattern: &Pattern) -> Result<Self::Output, Self::Error> {
        // Lucene patterns always match the whole term, so the body goes in unanchored.
        let value = if pattern.case_insensitive() {
            fold_case(pattern.body())
        } else {
            pattern.body().to_string()
        };

        Ok(field_filter("regexp", field, json!({ "value": value })))
    }

    fn visit_not(&mut self, filter: &NativeFilter) -> Result<Self::Output, Self::Error> {
        Ok(json!({ "not": self.visit_filter(filter)? }))
    }

    fn visit_and(&mut self, filters: &[NativeFilter]) -> Result<Self::Output, Self::Error> {
        Ok(json!({ "and": self.visit_all(filters)? }))
    }

    fn visit_or(&mut self, filters: &[NativeFilter]) -> Result<Self::Output, Self::Error> {
        Ok(json!({ "or": self.visit_all(filters)? }))
    }

    fn visit_pass_through(&mut self, field: &str, operator: &str, value: &Value) -> Result<Self::Output, Self::Error> {
        Ok(field_filter(operator, field, value.clone()))
    }
}

/// Renders the filter alone, wrapped in a `filtered` query.
///
/// Used for counts and delete-by-query, which take no window or aggregations.
pub(crate) fn query_body(query: &CompiledQuery) -> Result<Value, SearchLayerError> {
    Ok(json!({
        "query": {
            "filtered": {
                "filter": FilterTranslator.visit_filter(&query.filter)?,
            }
        }
    }))
}

/// Renders the full search request body for `query`.
pub(crate) fn search_body(query: &CompiledQuery) -> Result<Value, SearchLayerError> {
    let mut body = match query_body(query)? {
        Value::Object(body) => body,
        _ => Map::new(),
    };

    if let Some(size) = query.size {
        body.insert("size".to_string(), json!(size));
    }
    if let Some(from) = query.from {
        body.insert("from".to_string(), json!(from));
    }
    if !query.sort.is_empty() {
        body.insert(
            "sort".to_string(),
            Value::Array(
                query
                    .sort
                    .iter()
                    .map(|sort| {
                        let order = match sort.direction {
                            SortDirection::Asc => "asc",
                            SortDirection::Desc => "desc",
                        };
                        let mut key = Map::new();
                        key.insert(sort.field.clone(), json!({ "order": order }));

                        Value::Object(key)
                    })
                    .collect(),
            ),
        );
    }
    if let Some(aggregations) = &query.aggregations {
        body.insert(
            "aggs".to_string(),
            Value::Object(
                aggregations
                    .iter()
                    .map(|aggregation| {
                        (
                            aggregation.name.clone(),
                            field_filter(aggregation.metric.as_str(), "field", Value::String(aggregation.field.clone())),
                        )
                    })
                    .collect(),
            ),
        );
    }
    if let Some(facets) = &query.facets {
        body.insert("facets".to_string(), facets.clone());
    }
    if !query.fetch_source {
        body.insert("_source".to_string(), Value::Bool(false));
    }

    Ok(Value::Object(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchlayer_core::{
        compiler::compile_value,
        schema::{Attribute, AttributeType, Schema},
    };

    fn schema() -> Schema {
        Schema::new()
            .with("priority", Attribute::new(AttributeType::Integer))
            .with("title", Attribute::new(AttributeType::String))
    }

    fn filter(criteria: Value) -> Value {
        let query = compile_value(criteria, &schema(), "ticket").unwrap();

        FilterTranslator.visit_filter(&query.filter).unwrap()
    }

    #[test]
    fn test_terms_and_ids() {
        assert_eq!(filter(json!({ "where": { "priority": "3" } })), json!({ "term": { "priority": 3 } }));
        assert_eq!(
            filter(json!({ "where": { "title": ["a", "b"] } })),
            json!({ "terms": { "title": ["a", "b"] } })
        );
        assert_eq!(
            filter(json!({ "where": { "id": ["x", "y"] } })),
            json!({ "ids": { "values": ["x", "y"], "type": "ticket" } })
        );
        assert_eq!(filter(json!({})), json!({ "match_all": {} }));
    }

    #[test]
    fn test_ranges_and_patterns() {
        assert_eq!(
            filter(json!({ "where": { "priority": { ">": 1, "<=": "4" } } })),
            json!({ "range": { "priority": { "gt": 1, "lte": 4 } } })
        );
        assert_eq!(
            filter(json!({ "where": { "title": { "startsWith": "Fire" } } })),
            json!({ "regexp": { "title": { "value": "[fF][iI][rR][eE].*" } } })
        );
        assert_eq!(
            filter(json!({ "where": { "title": { "contains": "a.b 7" } } })),
            json!({ "regexp": { "title": { "value": r".*[aA]\.[bB] 7.*" } } })
        );
    }

    #[test]
    fn test_fold_case_keeps_escapes() {
        assert_eq!(fold_case(r"\(x\)"), r"\([xX]\)");
        assert_eq!(fold_case(r"\\n"), r"\\[nN]");
        assert_eq!(fold_case("Ünï-42"), "[üÜ][nN][ïÏ]-42");
    }

    #[test]
    fn test_combinators_and_pass_through() {
        assert_eq!(
            filter(json!({ "where": { "or": [{ "title": "a" }, { "priority": { "not": 2 } }] } })),
            json!({ "or": [
                { "term": { "title": "a" } },
                { "not": { "term": { "priority": 2 } } }
            ] })
        );
        assert_eq!(
            filter(json!({ "where": { "title": { "exists": true } } })),
            json!({ "exists": { "title": true } })
        );
    }

    #[test]
    fn test_search_body_envelope() {
        let query = compile_value(
            json!({
                "where": { "title": "a" },
                "limit": 5,
                "skip": 10,
                "sort": { "id": -1, "priority": 1 },
                "sum": ["priority"],
                "facets": { "tags": { "terms": { "field": "tags" } } }
            }),
            &schema(),
            "ticket",
        )
        .unwrap()
        .without_source();

        assert_eq!(
            search_body(&query).unwrap(),
            json!({
                "query": { "filtered": { "filter": { "term": { "title": "a" } } } },
                "size": 5,
                "from": 10,
                "sort": [{ "_id": { "order": "desc" } }, { "priority": { "order": "asc" } }],
                "aggs": { "sum_priority": { "sum": { "field": "priority" } } },
                "facets": { "tags": { "terms": { "field": "tags" } } },
                "_source": false
            })
        );
    }

    #[test]
    fn test_query_body_has_no_window() {
        let query = compile_value(json!({ "where": { "title": "a" }, "limit": 1 }), &schema(), "ticket").unwrap();

        assert_eq!(
            query_body(&query).unwrap(),
            json!({ "query": { "filtered": { "filter": { "term": { "title": "a" } } } } })
        );
    }
}
