//! Store-agnostic criteria: filters, sorting, pagination and aggregation options.
//!
//! Criteria usually arrive as loosely shaped JSON from an upstream caller. They are parsed
//! exactly once, at [`Criteria::from_value`], into closed variants ([`Clause`],
//! [`Expression`], [`Modifier`]) so the compiler never re-inspects raw JSON.
//!
//! # Criteria Building
//!
//! Criteria can also be constructed with the fluent builder API:
//!
//! ```ignore
//! use searchlayer_core::criteria::{Criteria, SortDirection, Where};
//!
//! let criteria = Criteria::builder()
//!     .filter(Where::eq("status", "open").and(Where::gt("priority", 2)))
//!     .limit(10)
//!     .skip(0)
//!     .sort("created_at", SortDirection::Desc)
//!     .build();
//! ```
//!
//! # Clause Construction API
//!
//! The [`Where`] struct provides static methods for building clauses:
//!
//! - Equality: `eq`, `one_of`, `not`, `not_one_of`
//! - Comparison: `gt`, `gte`, `lt`, `lte`
//! - String: `contains`, `like`, `starts_with`, `ends_with`
//! - Logical: `and`, `or`

use serde_json::{Map, Value};

use crate::{
    error::{SearchLayerError, SearchLayerResult},
    normalizer::id_string,
    schema::{ID_FIELD, INTERNAL_ID_FIELD},
};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Interprets a raw sort value: `0` and `-1` descend, everything else ascends.
    pub fn from_value(value: &Value) -> Self {
        match value.as_f64() {
            Some(order) if order == 0.0 || order == -1.0 => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }
}

/// Sort specification for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// The recognized modifier keys, resolved from raw keys through [`ModifierKind::lookup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierKind {
    Not,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Contains,
    Like,
    StartsWith,
    EndsWith,
    /// Any key without a dedicated meaning; passed through to the store.
    Other,
}

impl ModifierKind {
    /// Resolves a raw modifier key.
    ///
    /// Symbols and camel-case words match exactly; `not` and the short comparison keywords
    /// (`lt`, `lte`, `gt`, `gte`) match case-insensitively.
    pub fn lookup(key: &str) -> ModifierKind {
        match key {
            "!" => return ModifierKind::Not,
            "<" | "lessThan" => return ModifierKind::LessThan,
            "<=" | "lessThanOrEqual" => return ModifierKind::LessThanOrEqual,
            ">" | "greaterThan" => return ModifierKind::GreaterThan,
            ">=" | "greaterThanOrEqual" => return ModifierKind::GreaterThanOrEqual,
            "contains" => return ModifierKind::Contains,
            "like" => return ModifierKind::Like,
            "startsWith" => return ModifierKind::StartsWith,
            "endsWith" => return ModifierKind::EndsWith,
            _ => {}
        }

        match key.to_ascii_lowercase().as_str() {
            "not" => ModifierKind::Not,
            "lt" => ModifierKind::LessThan,
            "lte" => ModifierKind::LessThanOrEqual,
            "gt" => ModifierKind::GreaterThan,
            "gte" => ModifierKind::GreaterThanOrEqual,
            _ => ModifierKind::Other,
        }
    }
}

/// One entry of a modifier map.
#[derive(Debug, Clone, PartialEq)]
pub enum Modifier {
    /// Negates a nested expression.
    Not(Box<Expression>),
    LessThan(Value),
    LessThanOrEqual(Value),
    GreaterThan(Value),
    GreaterThanOrEqual(Value),
    Contains(Value),
    Like(Value),
    StartsWith(Value),
    EndsWith(Value),
    /// An unrecognized key and its value, passed through unchanged.
    Other(String, Value),
}

impl Modifier {
    /// Builds a modifier from a raw key and value.
    pub fn new(key: &str, value: Value) -> Self {
        match ModifierKind::lookup(key) {
            ModifierKind::Not => Modifier::Not(Box::new(Expression::from_value(value))),
            ModifierKind::LessThan => Modifier::LessThan(value),
            ModifierKind::LessThanOrEqual => Modifier::LessThanOrEqual(value),
            ModifierKind::GreaterThan => Modifier::GreaterThan(value),
            ModifierKind::GreaterThanOrEqual => Modifier::GreaterThanOrEqual(value),
            ModifierKind::Contains => Modifier::Contains(value),
            ModifierKind::Like => Modifier::Like(value),
            ModifierKind::StartsWith => Modifier::StartsWith(value),
            ModifierKind::EndsWith => Modifier::EndsWith(value),
            ModifierKind::Other => Modifier::Other(key.to_string(), value),
        }
    }
}

/// The right-hand side of a field filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A single value; compiles to equality.
    Literal(Value),
    /// A list of values; compiles to membership.
    List(Vec<Value>),
    /// A map of modifiers, each compiled to its own fragment.
    Modifiers(Vec<Modifier>),
}

impl Expression {
    /// Resolves a raw JSON value into an expression.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(values) => Expression::List(values),
            Value::Object(map) => Expression::Modifiers(
                map.into_iter()
                    .map(|(key, value)| Modifier::new(&key, value))
                    .collect(),
            ),
            value => Expression::Literal(value),
        }
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::from_value(value)
    }
}

/// A node of the filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// `field -> expression` pairs, all of which must match.
    Fields(Vec<(String, Expression)>),
    /// All sub-clauses must match.
    And(Vec<Clause>),
    /// Any sub-clause must match.
    Or(Vec<Clause>),
    /// A map mixing field pairs and combinators; every part must match.
    All(Vec<Clause>),
}

impl Clause {
    /// Parses a raw where-clause map.
    ///
    /// `and`/`or` values must be lists of clause maps; non-list values are dropped without
    /// emitting anything. A `like` key (any case) holds a `field -> pattern` map.
    ///
    /// # Errors
    ///
    /// Returns [`SearchLayerError::Compilation`] when the value, a sub-clause, or a `like`
    /// block is not a JSON object.
    pub fn from_value(value: Value) -> SearchLayerResult<Self> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(SearchLayerError::Compilation(format!(
                    "where clause must be an object, got {other}"
                )));
            }
        };

        let mut fields = Vec::new();
        let mut combinators = Vec::new();

        for (key, value) in map {
            match key.as_str() {
                "and" | "or" => {
                    let Value::Array(items) = value else {
                        tracing::warn!(combinator = %key, "ignoring non-list logical clause");
                        continue;
                    };

                    let children = items
                        .into_iter()
                        .map(Clause::from_value)
                        .collect::<SearchLayerResult<Vec<_>>>()?;

                    combinators.push(if key == "and" {
                        Clause::And(children)
                    } else {
                        Clause::Or(children)
                    });
                }
                _ if key.eq_ignore_ascii_case("like") => {
                    let Value::Object(patterns) = value else {
                        return Err(SearchLayerError::Compilation(
                            "like clause must map fields to patterns".to_string(),
                        ));
                    };

                    fields.extend(patterns.into_iter().map(|(field, pattern)| {
                        (field, Expression::Modifiers(vec![Modifier::Like(pattern)]))
                    }));
                }
                _ => fields.push((key, Expression::from_value(value))),
            }
        }

        Ok(match (fields.is_empty(), combinators.len()) {
            (_, 0) => Clause::Fields(fields),
            (true, 1) => combinators.remove(0),
            (true, _) => Clause::All(combinators),
            (false, _) => {
                let mut parts = vec![Clause::Fields(fields)];
                parts.extend(combinators);
                Clause::All(parts)
            }
        })
    }

    /// Combines this clause with another using logical AND.
    ///
    /// If this clause is already an AND, the other clause is appended to it.
    pub fn and(self, other: Clause) -> Self {
        match self {
            Clause::And(mut list) => {
                list.push(other);
                Clause::And(list)
            }
            _ => Clause::And(vec![self, other]),
        }
    }

    /// Combines this clause with another using logical OR.
    ///
    /// If this clause is already an OR, the other clause is appended to it.
    pub fn or(self, other: Clause) -> Self {
        match self {
            Clause::Or(mut list) => {
                list.push(other);
                Clause::Or(list)
            }
            _ => Clause::Or(vec![self, other]),
        }
    }

    /// Returns the identifiers of a pure identifier lookup.
    ///
    /// A clause is a pure lookup when it is exactly `{id: value}` with a truthy value, or
    /// `{id: [values]}`. Any other shape returns `None`.
    pub fn id_lookup(&self) -> Option<Vec<String>> {
        let Clause::Fields(fields) = self else {
            return None;
        };
        let [(field, expression)] = fields.as_slice() else {
            return None;
        };
        if field != ID_FIELD {
            return None;
        }

        match expression {
            Expression::Literal(value) if is_truthy(value) => id_string(value).map(|id| vec![id]),
            Expression::List(values) => values.iter().map(id_string).collect(),
            _ => None,
        }
    }

    /// Returns `true` when the clause only holds a falsy identifier, such as `{id: null}`.
    pub(crate) fn is_falsy_id(&self) -> bool {
        match self {
            Clause::Fields(fields) => match fields.as_slice() {
                [(field, Expression::Literal(value))] => {
                    (field == ID_FIELD || field == INTERNAL_ID_FIELD) && !is_truthy(value)
                }
                _ => false,
            },
            _ => false,
        }
    }
}

/// Helper struct for constructing clauses.
///
/// # Example
///
/// ```ignore
/// use searchlayer_core::criteria::Where;
///
/// let clause = Where::eq("status", "open")
///     .and(Where::starts_with("title", "Bug"));
/// ```
pub struct Where;

impl Where {
    fn field(field: impl Into<String>, expression: Expression) -> Clause {
        Clause::Fields(vec![(field.into(), expression)])
    }

    fn modifier(field: impl Into<String>, modifier: Modifier) -> Clause {
        Self::field(field, Expression::Modifiers(vec![modifier]))
    }

    /// Matches documents where the field equals the value.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Clause {
        Self::field(field, Expression::Literal(value.into()))
    }

    /// Matches documents where the field equals any of the values.
    pub fn one_of<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Clause {
        Self::field(field, Expression::List(values.into_iter().map(Into::into).collect()))
    }

    /// Matches documents where the field does not equal the value.
    pub fn not(field: impl Into<String>, value: impl Into<Value>) -> Clause {
        Self::modifier(field, Modifier::Not(Box::new(Expression::Literal(value.into()))))
    }

    /// Matches documents where the field equals none of the values.
    pub fn not_one_of<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Clause {
        Self::modifier(
            field,
            Modifier::Not(Box::new(Expression::List(values.into_iter().map(Into::into).collect()))),
        )
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Clause {
        Self::modifier(field, Modifier::GreaterThan(value.into()))
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Clause {
        Self::modifier(field, Modifier::GreaterThanOrEqual(value.into()))
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Clause {
        Self::modifier(field, Modifier::LessThan(value.into()))
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Clause {
        Self::modifier(field, Modifier::LessThanOrEqual(value.into()))
    }

    /// Case-insensitive substring match.
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Clause {
        Self::modifier(field, Modifier::Contains(Value::String(value.into())))
    }

    /// Case-insensitive match where `%` stands for any run of characters.
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Clause {
        Self::modifier(field, Modifier::Like(Value::String(pattern.into())))
    }

    /// Case-insensitive prefix match.
    pub fn starts_with(field: impl Into<String>, value: impl Into<String>) -> Clause {
        Self::modifier(field, Modifier::StartsWith(Value::String(value.into())))
    }

    /// Case-insensitive suffix match.
    pub fn ends_with(field: impl Into<String>, value: impl Into<String>) -> Clause {
        Self::modifier(field, Modifier::EndsWith(Value::String(value.into())))
    }

    pub fn and(clauses: impl IntoIterator<Item = Clause>) -> Clause {
        Clause::And(clauses.into_iter().collect())
    }

    pub fn or(clauses: impl IntoIterator<Item = Clause>) -> Clause {
        Clause::Or(clauses.into_iter().collect())
    }
}

/// The statistics requested by an aggregate query.
///
/// A statistic is `Some` only when it was supplied as a list of field names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateOptions {
    pub sum: Option<Vec<String>>,
    pub average: Option<Vec<String>>,
    pub min: Option<Vec<String>>,
    pub max: Option<Vec<String>>,
}

/// A complete, store-agnostic query description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    /// Optional filter tree; `None` matches every document.
    pub where_clause: Option<Clause>,
    /// Sort keys in priority order.
    pub sort: Vec<Sort>,
    /// Maximum number of documents to return.
    pub limit: Option<u64>,
    /// Number of documents to skip.
    pub skip: Option<u64>,
    /// Aggregation options; present whenever any statistic key was given.
    pub aggregate: Option<AggregateOptions>,
    /// Native facet block, passed to the store untouched.
    pub facets: Option<Value>,
}

impl Criteria {
    /// Creates empty criteria matching every document.
    pub fn new() -> Self {
        Criteria::default()
    }

    /// Creates a new criteria builder for fluent construction.
    pub fn builder() -> CriteriaBuilder {
        CriteriaBuilder::new()
    }

    /// Parses criteria from their JSON form.
    ///
    /// Recognized keys are `where`, `sort`, `limit`, `skip`, `sum`, `average`, `min`, `max`
    /// and `facets`. `select` and unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SearchLayerError::Compilation`] when a recognized key holds a value of the
    /// wrong shape.
    pub fn from_value(value: Value) -> SearchLayerResult<Self> {
        let map = match value {
            Value::Null => return Ok(Criteria::default()),
            Value::Object(map) => map,
            other => {
                return Err(SearchLayerError::Compilation(format!(
                    "criteria must be an object, got {other}"
                )));
            }
        };

        let mut criteria = Criteria::default();
        let mut aggregate: Option<AggregateOptions> = None;

        for (key, value) in map {
            match key.as_str() {
                "where" => {
                    criteria.where_clause = match value {
                        Value::Null => None,
                        value => Some(Clause::from_value(value)?),
                    };
                }
                "sort" => criteria.sort = parse_sort(value)?,
                "limit" => criteria.limit = parse_window(&key, value)?,
                "skip" => criteria.skip = parse_window(&key, value)?,
                "sum" | "average" | "min" | "max" => {
                    let fields = parse_field_list(&key, value)?;
                    let options = aggregate.get_or_insert_with(AggregateOptions::default);

                    match key.as_str() {
                        "sum" => options.sum = fields,
                        "average" => options.average = fields,
                        "min" => options.min = fields,
                        _ => options.max = fields,
                    }
                }
                "facets" => {
                    if !value.is_null() {
                        criteria.facets = Some(value);
                    }
                }
                "select" => {}
                _ => tracing::debug!(key = %key, "ignoring unsupported criteria key"),
            }
        }

        criteria.aggregate = aggregate;

        Ok(criteria)
    }

    /// Returns the identifiers when the where-clause is a pure identifier lookup.
    pub fn id_lookup(&self) -> Option<Vec<String>> {
        self.where_clause
            .as_ref()
            .and_then(Clause::id_lookup)
    }
}

impl TryFrom<Value> for Criteria {
    type Error = SearchLayerError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Criteria::from_value(value)
    }
}

fn parse_sort(value: Value) -> SearchLayerResult<Vec<Sort>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(field, order)| Sort {
                direction: SortDirection::from_value(&order),
                field,
            })
            .collect()),
        other => Err(SearchLayerError::Compilation(format!(
            "sort must map fields to directions, got {other}"
        ))),
    }
}

fn parse_window(key: &str, value: Value) -> SearchLayerResult<Option<u64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => number
            .as_u64()
            .map(Some)
            .ok_or_else(|| SearchLayerError::Compilation(format!(
                "{key} must be a non-negative integer, got {number}"
            ))),
        other => Err(SearchLayerError::Compilation(format!(
            "{key} must be a non-negative integer, got {other}"
        ))),
    }
}

fn parse_field_list(key: &str, value: Value) -> SearchLayerResult<Option<Vec<String>>> {
    let Value::Array(items) = value else {
        return Ok(None);
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::String(field) => Ok(field),
            other => Err(SearchLayerError::Compilation(format!(
                "{key} must list field names, got {other}"
            ))),
        })
        .collect::<SearchLayerResult<Vec<_>>>()
        .map(Some)
}

/// JavaScript-style truthiness, used where upstream callers send "empty" identifiers.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Builder for [`Criteria`].
#[derive(Debug, Clone, Default)]
pub struct CriteriaBuilder {
    criteria: Criteria,
}

impl CriteriaBuilder {
    /// Creates a new criteria builder.
    pub fn new() -> Self {
        CriteriaBuilder { criteria: Criteria::default() }
    }

    /// Sets the where-clause.
    pub fn filter(mut self, clause: Clause) -> Self {
        self.criteria.where_clause = Some(clause);
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: u64) -> Self {
        self.criteria.limit = Some(limit);
        self
    }

    /// Sets the number of documents to skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.criteria.skip = Some(skip);
        self
    }

    /// Appends a sort key.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.criteria.sort.push(Sort { field: field.into(), direction });
        self
    }

    /// Requests the sum of a field.
    pub fn sum(mut self, field: impl Into<String>) -> Self {
        self.aggregate().sum.get_or_insert_with(Vec::new).push(field.into());
        self
    }

    /// Requests the average of a field.
    pub fn average(mut self, field: impl Into<String>) -> Self {
        self.aggregate().average.get_or_insert_with(Vec::new).push(field.into());
        self
    }

    /// Requests the minimum of a field.
    pub fn min(mut self, field: impl Into<String>) -> Self {
        self.aggregate().min.get_or_insert_with(Vec::new).push(field.into());
        self
    }

    /// Requests the maximum of a field.
    pub fn max(mut self, field: impl Into<String>) -> Self {
        self.aggregate().max.get_or_insert_with(Vec::new).push(field.into());
        self
    }

    /// Attaches a native facet block.
    pub fn facets(mut self, facets: Map<String, Value>) -> Self {
        self.criteria.facets = Some(Value::Object(facets));
        self
    }

    /// Builds and returns the final criteria.
    pub fn build(self) -> Criteria {
        self.criteria
    }

    fn aggregate(&mut self) -> &mut AggregateOptions {
        self.criteria.aggregate.get_or_insert_with(AggregateOptions::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_modifier_lookup() {
        assert_eq!(ModifierKind::lookup("!"), ModifierKind::Not);
        assert_eq!(ModifierKind::lookup("NOT"), ModifierKind::Not);
        assert_eq!(ModifierKind::lookup("lessThan"), ModifierKind::LessThan);
        assert_eq!(ModifierKind::lookup("LTE"), ModifierKind::LessThanOrEqual);
        assert_eq!(ModifierKind::lookup(">="), ModifierKind::GreaterThanOrEqual);
        assert_eq!(ModifierKind::lookup("startsWith"), ModifierKind::StartsWith);
        assert_eq!(ModifierKind::lookup("exists"), ModifierKind::Other);
    }

    #[test]
    fn test_expression_variants() {
        assert_eq!(Expression::from_value(json!("a")), Expression::Literal(json!("a")));
        assert_eq!(Expression::from_value(json!(["a", "b"])), Expression::List(vec![json!("a"), json!("b")]));
        assert_eq!(
            Expression::from_value(json!({ "not": { ">": 3 } })),
            Expression::Modifiers(vec![Modifier::Not(Box::new(Expression::Modifiers(vec![
                Modifier::GreaterThan(json!(3))
            ])))])
        );
    }

    #[test]
    fn test_clause_parses_combinators_and_like() {
        let clause = Clause::from_value(json!({
            "status": "open",
            "or": [{ "priority": 1 }, { "priority": 2 }],
            "LIKE": { "title": "%bug%" }
        }))
        .unwrap();

        assert_eq!(
            clause,
            Clause::All(vec![
                Clause::Fields(vec![
                    ("status".to_string(), Expression::Literal(json!("open"))),
                    ("title".to_string(), Expression::Modifiers(vec![Modifier::Like(json!("%bug%"))])),
                ]),
                Clause::Or(vec![
                    Clause::Fields(vec![("priority".to_string(), Expression::Literal(json!(1)))]),
                    Clause::Fields(vec![("priority".to_string(), Expression::Literal(json!(2)))]),
                ]),
            ])
        );
    }

    #[test]
    fn test_non_list_combinator_is_dropped() {
        let clause = Clause::from_value(json!({ "and": { "status": "open" } })).unwrap();
        assert_eq!(clause, Clause::Fields(vec![]));
    }

    #[test]
    fn test_id_lookup() {
        let lookup = |value: Value| Clause::from_value(value).unwrap().id_lookup();

        assert_eq!(lookup(json!({ "id": "a" })), Some(vec!["a".to_string()]));
        assert_eq!(lookup(json!({ "id": ["a", 7] })), Some(vec!["a".to_string(), "7".to_string()]));
        assert_eq!(lookup(json!({ "id": "" })), None);
        assert_eq!(lookup(json!({ "id": "a", "status": "open" })), None);
        assert_eq!(lookup(json!({ "id": { "not": "a" } })), None);
    }

    #[test]
    fn test_criteria_from_value() {
        let criteria = Criteria::from_value(json!({
            "where": { "status": "open" },
            "sort": { "createdAt": -1, "title": 1 },
            "limit": 5,
            "skip": 10,
            "sum": ["amount"],
            "max": "amount",
            "select": ["title"]
        }))
        .unwrap();

        assert_eq!(criteria.limit, Some(5));
        assert_eq!(criteria.skip, Some(10));
        assert_eq!(criteria.sort[0], Sort { field: "createdAt".to_string(), direction: SortDirection::Desc });
        assert_eq!(criteria.sort[1].direction, SortDirection::Asc);
        assert_eq!(
            criteria.aggregate,
            Some(AggregateOptions { sum: Some(vec!["amount".to_string()]), ..Default::default() })
        );
    }

    #[test]
    fn test_criteria_rejects_malformed_values() {
        assert!(matches!(
            Criteria::from_value(json!({ "limit": -1 })),
            Err(SearchLayerError::Compilation(_))
        ));
        assert!(matches!(
            Criteria::from_value(json!({ "where": "status" })),
            Err(SearchLayerError::Compilation(_))
        ));
        assert!(matches!(
            Criteria::from_value(json!({ "sort": "title" })),
            Err(SearchLayerError::Compilation(_))
        ));
    }

    #[test]
    fn test_builder() {
        let criteria = Criteria::builder()
            .filter(Where::eq("status", "open"))
            .limit(3)
            .sort("title", SortDirection::Asc)
            .sum("amount")
            .max("amount")
            .build();

        assert_eq!(criteria.limit, Some(3));
        let aggregate = criteria.aggregate.unwrap();
        assert_eq!(aggregate.sum, Some(vec!["amount".to_string()]));
        assert_eq!(aggregate.max, Some(vec!["amount".to_string()]));
        assert_eq!(aggregate.average, None);
    }
}
