//! Collection schemas and their normalization.
//!
//! A [`Schema`] maps attribute names to their declared type and key flags. It is supplied once,
//! when a collection is set up, and is read-only afterwards: every compilation and
//! normalization function takes it as an explicit argument.
//!
//! # Example
//!
//! ```ignore
//! use searchlayer_core::schema::{Attribute, AttributeType, CollectionDefinition, Schema};
//!
//! let definition = CollectionDefinition::new(
//!     "Ticket",
//!     Schema::new()
//!         .with("title", Attribute::new(AttributeType::String))
//!         .with("priority", Attribute::new(AttributeType::Integer)),
//! );
//!
//! let collection = definition.normalize();
//! assert_eq!(collection.identity(), "ticket");
//! assert_eq!(collection.primary_key(), "id");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The logical identifier field exposed to callers.
pub const ID_FIELD: &str = "id";

/// The store-internal identifier field, never exposed to callers.
pub const INTERNAL_ID_FIELD: &str = "_id";

/// Declared type of a schema attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    Datetime,
    Json,
    Array,
    /// Any type name this crate does not interpret.
    #[serde(other)]
    Other,
}

impl AttributeType {
    /// Returns `true` for genuinely string-typed attributes, whose values are never coerced.
    pub fn is_textual(&self) -> bool {
        matches!(self, AttributeType::String | AttributeType::Text)
    }

    /// Returns `true` for attributes holding calendar values.
    pub fn is_temporal(&self) -> bool {
        matches!(self, AttributeType::Date | AttributeType::Datetime)
    }
}

/// A single attribute declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    /// The declared type.
    #[serde(rename = "type")]
    pub kind: AttributeType,
    /// Whether this attribute is the collection's primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Whether this attribute references another collection.
    #[serde(default)]
    pub foreign_key: bool,
    /// Whether the store is expected to generate this attribute's values.
    #[serde(default)]
    pub auto_increment: bool,
}

impl Attribute {
    /// Creates a plain attribute of the given type.
    pub fn new(kind: AttributeType) -> Self {
        Self { kind, primary_key: false, foreign_key: false, auto_increment: false }
    }

    /// Marks the attribute as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the attribute as a foreign key.
    pub fn foreign_key(mut self) -> Self {
        self.foreign_key = true;
        self
    }

    /// Marks the attribute as auto-incrementing.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
}

/// Attribute declarations of one collection, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    /// Creates an empty schema. Every field of an empty schema is treated as untyped.
    pub fn new() -> Self {
        Self { attributes: BTreeMap::new() }
    }

    /// Adds or replaces an attribute declaration.
    pub fn with(mut self, field: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(field.into(), attribute);
        self
    }

    /// Returns the declaration of `field`, if any.
    pub fn get(&self, field: &str) -> Option<&Attribute> {
        self.attributes.get(field)
    }

    /// Returns the declared type of `field`, if the field is declared.
    pub fn declared_type(&self, field: &str) -> Option<AttributeType> {
        self.attributes.get(field).map(|attribute| attribute.kind)
    }

    /// Returns the name of the primary key field, `"id"` when no attribute is flagged.
    pub fn primary_key(&self) -> &str {
        self.attributes
            .iter()
            .find(|(_, attribute)| attribute.primary_key)
            .map(|(name, _)| name.as_str())
            .unwrap_or(ID_FIELD)
    }

    /// Iterates over the declared attributes in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Attribute)> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// A collection definition as supplied by the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDefinition {
    /// The collection identity, used as the store type name.
    pub identity: String,
    /// Explicit store type name overriding the identity.
    #[serde(default)]
    pub table_name: Option<String>,
    /// The attribute declarations.
    #[serde(default)]
    pub attributes: Schema,
}

impl CollectionDefinition {
    /// Creates a definition with the given identity and attributes.
    pub fn new(identity: impl Into<String>, attributes: Schema) -> Self {
        Self { identity: identity.into(), table_name: None, attributes }
    }

    /// Overrides the store type name.
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// Normalizes the definition for a store that generates string identifiers.
    ///
    /// - The type name is the table name when given, the lower-cased identity otherwise.
    /// - An integer primary key named `id` becomes a string, as do all foreign keys.
    /// - Auto-increment flags are cleared; the store assigns identifiers itself.
    pub fn normalize(self) -> CollectionSchema {
        let type_name = self
            .table_name
            .unwrap_or_else(|| self.identity.to_lowercase());

        let attributes = self
            .attributes
            .attributes
            .into_iter()
            .map(|(name, mut attribute)| {
                if name == ID_FIELD && attribute.primary_key && attribute.kind == AttributeType::Integer {
                    attribute.kind = AttributeType::String;
                }
                if attribute.foreign_key {
                    attribute.kind = AttributeType::String;
                }
                attribute.auto_increment = false;

                (name, attribute)
            })
            .collect();

        CollectionSchema {
            type_name,
            schema: Schema { attributes },
        }
    }
}

/// A normalized collection: its store type name and its read-only schema.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSchema {
    type_name: String,
    schema: Schema,
}

impl CollectionSchema {
    /// Returns the store type name of this collection.
    pub fn identity(&self) -> &str {
        &self.type_name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the name of the primary key field.
    pub fn primary_key(&self) -> &str {
        self.schema.primary_key()
    }
}

impl From<CollectionDefinition> for CollectionSchema {
    fn from(definition: CollectionDefinition) -> Self {
        definition.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primary_key_defaults_to_id() {
        let schema = Schema::new().with("name", Attribute::new(AttributeType::String));
        assert_eq!(schema.primary_key(), "id");

        let schema = schema.with("code", Attribute::new(AttributeType::String).primary_key());
        assert_eq!(schema.primary_key(), "code");
    }

    #[test]
    fn test_normalize_rewrites_key_types() {
        let definition = CollectionDefinition::new(
            "Ticket",
            Schema::new()
                .with("id", Attribute::new(AttributeType::Integer).primary_key().auto_increment())
                .with("owner", Attribute::new(AttributeType::Integer).foreign_key())
                .with("priority", Attribute::new(AttributeType::Integer)),
        );

        let collection = definition.normalize();

        assert_eq!(collection.identity(), "ticket");
        assert_eq!(collection.schema().declared_type("id"), Some(AttributeType::String));
        assert_eq!(collection.schema().declared_type("owner"), Some(AttributeType::String));
        assert_eq!(collection.schema().declared_type("priority"), Some(AttributeType::Integer));
        assert!(!collection.schema().get("id").unwrap().auto_increment);
    }

    #[test]
    fn test_table_name_overrides_identity() {
        let collection = CollectionDefinition::new("Ticket", Schema::new())
            .with_table_name("support_tickets")
            .normalize();

        assert_eq!(collection.identity(), "support_tickets");
    }

    #[test]
    fn test_definition_deserializes_from_json() {
        let definition: CollectionDefinition = serde_json::from_value(json!({
            "identity": "Invoice",
            "attributes": {
                "amount": { "type": "float" },
                "customer": { "type": "integer", "foreignKey": true },
                "geo": { "type": "point" }
            }
        }))
        .unwrap();

        assert_eq!(definition.attributes.declared_type("amount"), Some(AttributeType::Float));
        assert_eq!(definition.attributes.declared_type("geo"), Some(AttributeType::Other));
        assert!(definition.attributes.get("customer").unwrap().foreign_key);
    }
}
