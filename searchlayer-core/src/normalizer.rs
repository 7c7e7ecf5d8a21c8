//! Schema-aware value coercion and identifier renaming.
//!
//! Values flowing towards the store are coerced against the collection [`Schema`] so that a
//! textual `"42"` sent for an integer field is stored and matched as `42`. Records flowing back
//! carry the store identifier as `_id`; [`rewrite_ids`] exposes it as the logical `id`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};

use crate::{
    document::Record,
    error::{SearchLayerError, SearchLayerResult},
    schema::{AttributeType, ID_FIELD, INTERNAL_ID_FIELD, Schema},
};

const REGEX_METACHARACTERS: &[char] = &[
    '-', '[', ']', '{', '}', '(', ')', '+', '?', '*', '.', '\\', '/', ',', '^', '$', '|', '#',
];

/// Coerces a value against the declared type of `field`.
///
/// Only textual values on declared, non-string fields change: integer fields parse a leading
/// integer, float fields parse a float, and every other type maps `"true"`, `"false"` and
/// `"null"`. Text that does not parse stays text. Arrays are coerced element-wise.
pub fn coerce_value(schema: &Schema, field: &str, value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| coerce_value(schema, field, item))
                .collect(),
        ),
        Value::String(text) => match schema.declared_type(field) {
            Some(kind) if !kind.is_textual() => coerce_text(kind, text).unwrap_or_else(|| value.clone()),
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}

fn coerce_text(kind: AttributeType, text: &str) -> Option<Value> {
    match kind {
        AttributeType::Integer => parse_leading_integer(text).map(Value::from),
        AttributeType::Float => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        _ => match text {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            "null" => Some(Value::Null),
            _ => None,
        },
    }
}

fn parse_leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    digits[..end]
        .parse::<i64>()
        .ok()
        .map(|number| sign * number)
}

/// Escapes every regular expression metacharacter in `literal`.
pub fn escape_regex(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());

    for c in literal.chars() {
        if REGEX_METACHARACTERS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

/// Renders an identifier value as the store's string identifier.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// A document body ready to be written, with its identifier split out.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDocument {
    /// The identifier to write the document under; the store generates one when `None`.
    pub id: Option<String>,
    /// The body, without any identifier fields.
    pub body: Record,
}

/// Prepares a record for writing.
///
/// Works on a copy of `record`: drops `_id`, lifts `id` out as the store identifier, coerces
/// every value against the schema, and canonicalizes `date`/`datetime` values to RFC 3339.
///
/// # Errors
///
/// Returns [`SearchLayerError::InvalidDocument`] when a temporal field holds a value that is
/// neither a recognizable date string nor an epoch timestamp in milliseconds.
pub fn prepare_document(schema: &Schema, record: &Record) -> SearchLayerResult<PreparedDocument> {
    let mut id = None;
    let mut body = Record::new();

    for (field, value) in record {
        if field == INTERNAL_ID_FIELD {
            continue;
        }
        if field == ID_FIELD {
            id = id_string(value);
            continue;
        }

        let value = coerce_value(schema, field, value);
        let value = match schema.declared_type(field) {
            Some(kind) if kind.is_temporal() => canonicalize_temporal(field, value)?,
            _ => value,
        };

        body.insert(field.clone(), value);
    }

    Ok(PreparedDocument { id, body })
}

fn canonicalize_temporal(field: &str, value: Value) -> SearchLayerResult<Value> {
    let timestamp = match &value {
        Value::Null => return Ok(value),
        Value::String(text) => parse_timestamp(text),
        Value::Number(millis) => millis
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    };

    timestamp
        .map(|timestamp| Value::String(timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
        .ok_or_else(|| {
            SearchLayerError::InvalidDocument(format!("{field} is not a valid date: {value}"))
        })
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Moves the store identifier `_id` of each record to the logical `id` field.
///
/// Records without `_id` are returned unchanged, so the rewrite can be applied any number of
/// times.
pub fn rewrite_ids(records: Vec<Record>) -> Vec<Record> {
    records
        .into_iter()
        .map(rewrite_id)
        .collect()
}

pub(crate) fn rewrite_id(mut record: Record) -> Record {
    if let Some(id) = record.remove(INTERNAL_ID_FIELD) {
        record.insert(ID_FIELD.to_string(), id);
    }
    record
}

/// Builds the caller-facing record for a stored source and its identifier.
pub(crate) fn hydrate(id: &str, mut source: Record) -> Record {
    source.insert(INTERNAL_ID_FIELD.to_string(), Value::String(id.to_string()));
    rewrite_id(source)
}
