//! Records and typed models.
//!
//! The orchestrator works on [`Record`]s: plain JSON objects carrying the logical `id`. The
//! [`Model`] trait lets an application bind a Rust type to a collection definition and move
//! between the two representations through serde.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, from_value, to_value};

use crate::{
    error::{SearchLayerError, SearchLayerResult},
    schema::{CollectionDefinition, Schema},
};

/// A schemaless document as exchanged with callers.
pub type Record = serde_json::Map<String, Value>;

/// A Rust type stored as documents of one collection.
///
/// Usually derived with `#[derive(Model)]`, which builds the schema from the struct fields.
///
/// # Example
///
/// ```ignore
/// use searchlayer_core::document::Model;
/// use searchlayer_core::schema::{Attribute, AttributeType, Schema};
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Ticket {
///     pub id: Option<String>,
///     pub title: String,
/// }
///
/// impl Model for Ticket {
///     fn identity() -> &'static str {
///         "ticket"
///     }
///
///     fn schema() -> Schema {
///         Schema::new().with("title", Attribute::new(AttributeType::String))
///     }
/// }
/// ```
pub trait Model: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// The collection identity; its lower-cased form is the store type name.
    fn identity() -> &'static str;

    /// The attribute declarations of the collection.
    fn schema() -> Schema;

    /// The full collection definition, ready to be normalized.
    fn definition() -> CollectionDefinition {
        CollectionDefinition::new(Self::identity(), Self::schema())
    }
}

/// Conversions between a [`Model`] and a [`Record`].
///
/// Automatically implemented for every [`Model`].
pub trait ModelExt: Model {
    /// Serializes the model into a record.
    ///
    /// # Errors
    ///
    /// Returns [`SearchLayerError::InvalidDocument`] if the model does not serialize to a JSON
    /// object, or [`SearchLayerError::Serialization`] if serialization fails.
    fn to_record(&self) -> SearchLayerResult<Record>;

    /// Deserializes a model from a record.
    ///
    /// # Errors
    ///
    /// Returns [`SearchLayerError::Serialization`] if the record does not fit the model.
    fn from_record(record: Record) -> SearchLayerResult<Self>;
}

impl<M: Model> ModelExt for M {
    fn to_record(&self) -> SearchLayerResult<Record> {
        match to_value(self)? {
            Value::Object(record) => Ok(record),
            other => Err(SearchLayerError::InvalidDocument(format!(
                "{} must serialize to an object, got {other}",
                M::identity()
            ))),
        }
    }

    fn from_record(record: Record) -> SearchLayerResult<Self> {
        Ok(from_value(Value::Object(record))?)
    }
}

/// Converts a JSON value into a record.
///
/// # Errors
///
/// Returns [`SearchLayerError::InvalidDocument`] if the value is not an object.
pub fn into_record(value: Value) -> SearchLayerResult<Record> {
    match value {
        Value::Object(record) => Ok(record),
        other => Err(SearchLayerError::InvalidDocument(format!(
            "documents must be objects, got {other}"
        ))),
    }
}
