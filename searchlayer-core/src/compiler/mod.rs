//! The criteria-to-query compiler.
//!
//! [`compile`] turns [`Criteria`] into a [`CompiledQuery`]: a native filter tree together with
//! sort, window and aggregation settings. The compiler is pure; it never talks to a store, so
//! every [`Compilation`](crate::error::SearchLayerError::Compilation) or
//! [`InvalidGroupBy`](crate::error::SearchLayerError::InvalidGroupBy) error is raised
//! before a request is sent.
//!
//! # Example
//!
//! ```ignore
//! use searchlayer_core::compiler::compile;
//! use searchlayer_core::criteria::Criteria;
//! use serde_json::json;
//!
//! let criteria = Criteria::from_value(json!({
//!     "where": { "age": { ">": "18" } },
//!     "sort": { "id": -1 },
//!     "limit": 10
//! }))?;
//!
//! let query = compile(&criteria, &schema, "user")?;
//! assert_eq!(query.size, Some(10));
//! ```

pub mod aggregate;
pub mod clause;
pub mod expression;

use serde_json::Value;

use crate::{
    criteria::{Criteria, Sort},
    error::SearchLayerResult,
    native::NativeFilter,
    schema::{ID_FIELD, INTERNAL_ID_FIELD, Schema},
};

pub use aggregate::{Aggregation, Metric};
pub use clause::{parse_clause, parse_where};
pub use expression::parse_expression;

/// A compiled query, ready to be sent to a store client.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// The store type the query is scoped to.
    pub type_name: String,
    pub filter: NativeFilter,
    /// Sort keys, with `id` renamed to the store identifier.
    pub sort: Vec<Sort>,
    /// Maximum number of hits; the store default applies when `None`.
    pub size: Option<u64>,
    /// Number of hits to skip.
    pub from: Option<u64>,
    /// Aggregation buckets; `Some` marks an aggregate query.
    pub aggregations: Option<Vec<Aggregation>>,
    /// A native facet block, forwarded untouched.
    pub facets: Option<Value>,
    /// Whether hits should carry their source.
    pub fetch_source: bool,
}

impl CompiledQuery {
    /// Creates a query matching every document of `type_name`.
    pub fn match_all(type_name: impl Into<String>) -> Self {
        Self::filtered(type_name, NativeFilter::MatchAll)
    }

    /// Creates a query for `filter` with no sort, window or aggregations.
    pub fn filtered(type_name: impl Into<String>, filter: NativeFilter) -> Self {
        Self {
            type_name: type_name.into(),
            filter,
            sort: Vec::new(),
            size: None,
            from: None,
            aggregations: None,
            facets: None,
            fetch_source: true,
        }
    }

    /// Returns `true` when the query requests aggregations.
    pub fn is_aggregate(&self) -> bool {
        self.aggregations.is_some()
    }

    /// Returns `true` when the caller expects aggregation or facet payloads back.
    pub fn has_payloads(&self) -> bool {
        self.aggregations.is_some() || self.facets.is_some()
    }

    /// Requests hits without their source.
    pub fn without_source(mut self) -> Self {
        self.fetch_source = false;
        self
    }

    /// Applies `limit` as the size when the query carries none.
    pub fn with_default_size(mut self, limit: u64) -> Self {
        self.size.get_or_insert(limit);
        self
    }
}

/// Compiles criteria against one collection's schema and store type.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'a> {
    schema: &'a Schema,
    type_name: &'a str,
}

impl<'a> Compiler<'a> {
    pub fn new(schema: &'a Schema, type_name: &'a str) -> Self {
        Self { schema, type_name }
    }

    /// Compiles `criteria` into a [`CompiledQuery`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidGroupBy`](crate::error::SearchLayerError::InvalidGroupBy) when
    /// aggregation keys are present but none lists fields.
    pub fn compile(&self, criteria: &Criteria) -> SearchLayerResult<CompiledQuery> {
        let aggregations = criteria
            .aggregate
            .as_ref()
            .map(aggregate::build)
            .transpose()?;

        let query = CompiledQuery {
            type_name: self.type_name.to_string(),
            filter: parse_where(criteria.where_clause.as_ref(), self.schema, self.type_name),
            sort: criteria
                .sort
                .iter()
                .map(|sort| Sort {
                    field: if sort.field == ID_FIELD {
                        INTERNAL_ID_FIELD.to_string()
                    } else {
                        sort.field.clone()
                    },
                    direction: sort.direction,
                })
                .collect(),
            size: criteria.limit,
            from: criteria.skip,
            aggregations,
            facets: criteria.facets.clone(),
            fetch_source: true,
        };

        tracing::debug!(
            type_name = %query.type_name,
            filter = ?query.filter,
            size = ?query.size,
            from = ?query.from,
            aggregate = query.is_aggregate(),
            "compiled criteria"
        );

        Ok(query)
    }
}

/// Compiles `criteria` for the collection with the given schema and store type.
///
/// # Errors
///
/// See [`Compiler::compile`].
pub fn compile(criteria: &Criteria, schema: &Schema, type_name: &str) -> SearchLayerResult<CompiledQuery> {
    Compiler::new(schema, type_name).compile(criteria)
}

/// Parses raw JSON criteria and compiles them in one step.
///
/// # Errors
///
/// Returns [`Compilation`](crate::error::SearchLayerError::Compilation) for malformed
/// criteria, or any error of [`Compiler::compile`].
pub fn compile_value(criteria: Value, schema: &Schema, type_name: &str) -> SearchLayerResult<CompiledQuery> {
    let criteria = Criteria::from_value(criteria)?;
    compile(&criteria, schema, type_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        criteria::SortDirection,
        error::SearchLayerError,
        schema::{Attribute, AttributeType},
    };
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new().with("age", Attribute::new(AttributeType::Integer))
    }

    #[test]
    fn test_compile_envelope() {
        let query = compile_value(
            json!({
                "where": { "age": "30" },
                "sort": { "id": 0, "age": 1 },
                "limit": 5,
                "skip": 15
            }),
            &schema(),
            "user",
        )
        .unwrap();

        assert_eq!(query.filter, NativeFilter::Term { field: "age".to_string(), value: json!(30) });
        assert_eq!(query.sort[0], Sort { field: "_id".to_string(), direction: SortDirection::Desc });
        assert_eq!(query.sort[1], Sort { field: "age".to_string(), direction: SortDirection::Asc });
        assert_eq!(query.size, Some(5));
        assert_eq!(query.from, Some(15));
        assert!(!query.is_aggregate());
        assert!(query.fetch_source);
    }

    #[test]
    fn test_compile_aggregate() {
        let query = compile_value(json!({ "where": null, "sum": ["age"] }), &schema(), "user").unwrap();

        assert!(query.is_aggregate());
        assert_eq!(query.filter, NativeFilter::MatchAll);
        assert_eq!(query.aggregations.unwrap()[0].name, "sum_age");
    }

    #[test]
    fn test_invalid_group_by_propagates() {
        assert!(matches!(
            compile_value(json!({ "average": "age" }), &schema(), "user"),
            Err(SearchLayerError::InvalidGroupBy)
        ));
    }

    #[test]
    fn test_malformed_criteria_is_a_compilation_error() {
        assert!(matches!(
            compile_value(json!({ "where": [1, 2] }), &schema(), "user"),
            Err(SearchLayerError::Compilation(_))
        ));
    }
}
