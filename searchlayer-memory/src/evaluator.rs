//! Filter evaluation for in-memory search.
//!
//! This module walks compiled [`NativeFilter`] trees against stored records, following the
//! matching rules of a search store: a term matches an array field when any element matches,
//! and a range or pattern never matches a missing field.

use regex::Regex;
use serde_json::Value;
use std::{cmp::Ordering, collections::HashMap};

use searchlayer_core::{
    document::Record,
    error::{SearchLayerError, SearchLayerResult},
    native::{FilterVisitor, NativeFilter, Pattern, RangeBound},
    normalizer::id_string,
    schema::INTERNAL_ID_FIELD,
};

/// Comparable view of a JSON value.
///
/// Integers and floats compare as `f64`; values of different kinds never compare.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(value) => Comparable::Bool(*value),
            Value::Number(value) => value
                .as_f64()
                .map(Comparable::Number)
                .unwrap_or(Comparable::Null),
            Value::String(value) => Comparable::String(value),
            Value::Array(values) => Comparable::Array(
                values
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Value::Object(map) => Comparable::Map(
                map
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Resolves `field` in `record`, following dots into nested objects.
///
/// `_id` resolves to nothing; identifiers live outside the record.
pub(crate) fn lookup<'a>(record: &'a Record, field: &str) -> Option<&'a Value> {
    if field == INTERNAL_ID_FIELD {
        return None;
    }
    if let Some(value) = record.get(field) {
        return Some(value);
    }

    let mut segments = field.split('.');
    let mut current = record.get(segments.next()?)?;

    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }

    Some(current)
}

/// Compiled patterns, keyed by their anchored source.
#[derive(Debug, Default)]
pub(crate) struct PatternCache {
    patterns: HashMap<String, Regex>,
}

impl PatternCache {
    fn get(&mut self, pattern: &Pattern) -> SearchLayerResult<&Regex> {
        let source = if pattern.case_insensitive() {
            format!("(?i){}", pattern.anchored())
        } else {
            pattern.anchored()
        };

        if !self.patterns.contains_key(&source) {
            let regex = Regex::new(&source)
                .map_err(|e| SearchLayerError::Store(e.to_string()))?;
            self.patterns.insert(source.clone(), regex);
        }

        self.patterns
            .get(&source)
            .ok_or_else(|| SearchLayerError::Store(format!("pattern {source} was not compiled")))
    }
}

pub(crate) struct RecordEvaluator<'a> {
    id: &'a str,
    record: &'a Record,
    patterns: &'a mut PatternCache,
}

impl<'a> RecordEvaluator<'a> {
    pub fn new(id: &'a str, record: &'a Record, patterns: &'a mut PatternCache) -> Self {
        Self { id, record, patterns }
    }

    pub fn evaluate(&mut self, filter: &NativeFilter) -> SearchLayerResult<bool> {
        self.visit_filter(filter)
    }

    /// Returns the entries of `records` matched by `filter`, in key order.
    pub fn filter_records<'r>(
        records: impl IntoIterator<Item = (&'r String, &'r Record)>,
        filter: &NativeFilter,
    ) -> SearchLayerResult<Vec<(&'r String, &'r Record)>> {
        let mut patterns = PatternCache::default();
        let mut matched = Vec::new();

        for (id, record) in records {
            if RecordEvaluator::new(id, record, &mut patterns).evaluate(filter)? {
                matched.push((id, record));
            }
        }

        Ok(matched)
    }

    fn field(&self, field: &str) -> Option<&'a Value> {
        lookup(self.record, field)
    }
}

/// Applies `check` to a value, or to each element when the value is an array.
fn any_element(value: &Value, mut check: impl FnMut(&Value) -> bool) -> bool {
    match value {
        Value::Array(items) => items.iter().any(check),
        value => check(value),
    }
}

impl<'a> FilterVisitor for RecordEvaluator<'a> {
    type Output = bool;
    type Error = SearchLayerError;

    fn visit_match_all(&mut self) -> Result<Self::Output, Self::Error> {
        Ok(true)
    }

    fn visit_term(&mut self, field: &str, value: &Value) -> Result<Self::Output, Self::Error> {
        Ok(self
            .field(field)
            .is_some_and(|stored| {
                any_element(stored, |item| Comparable::from(item) == Comparable::from(value))
            }))
    }

    fn visit_terms(&mut self, field: &str, values: &[Value]) -> Result<Self::Output, Self::Error> {
        Ok(self
            .field(field)
            .is_some_and(|stored| {
                any_element(stored, |item| {
                    values
                        .iter()
                        .any(|value| Comparable::from(item) == Comparable::from(value))
                })
            }))
    }

    fn visit_ids(&mut self, values: &[Value], _type_name: Option<&str>) -> Result<Self::Output, Self::Error> {
        Ok(values
            .iter()
            .filter_map(id_string)
            .any(|id| id == self.id))
    }

    fn visit_range(&mut self, field: &str, bounds: &[(RangeBound, Value)]) -> Result<Self::Output, Self::Error> {
        Ok(self
            .field(field)
            .is_some_and(|stored| {
                any_element(stored, |item| {
                    bounds.iter().all(|(bound, value)| {
                        match Comparable::from(item).partial_cmp(&Comparable::from(value)) {
                            Some(ordering) => match bound {
                                RangeBound::Gt => ordering == Ordering::Greater,
                                RangeBound::Gte => ordering != Ordering::Less,
                                RangeBound::Lt => ordering == Ordering::Less,
                                RangeBound::Lte => ordering != Ordering::Greater,
                            },
                            None => false,
                        }
                    })
                })
            }))
    }

    fn visit_regexp(&mut self, field: &str, pattern: &Pattern) -> Result<Self::Output, Self::Error> {
        let Some(stored) = self.field(field) else {
            return Ok(false);
        };
        let regex = self.patterns.get(pattern)?;

        Ok(any_element(stored, |item| {
            item.as_str()
                .is_some_and(|text| regex.is_match(text))
        }))
    }

    fn visit_not(&mut self, filter: &NativeFilter) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_filter(filter)?)
    }

    fn visit_and(&mut self, filters: &[NativeFilter]) -> Result<Self::Output, Self::Error> {
        for filter in filters {
            if !self.visit_filter(filter)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, filters: &[NativeFilter]) -> Result<Self::Output, Self::Error> {
        for filter in filters {
            if self.visit_filter(filter)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_pass_through(&mut self, field: &str, operator: &str, _value: &Value) -> Result<Self::Output, Self::Error> {
        Err(SearchLayerError::Store(format!(
            "in-memory search does not support operator `{operator}` on `{field}`"
        )))
    }
}
