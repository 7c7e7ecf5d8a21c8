//! The store-neutral native filter tree produced by the compiler.
//!
//! A [`NativeFilter`] mirrors the shape of a search store's filter DSL (term, terms, ids, range,
//! regexp, boolean combinators) without committing to a wire format. Store clients walk it with
//! a [`FilterVisitor`]: the Elasticsearch client renders JSON, the in-memory client evaluates it
//! against records.

use serde_json::Value;

use crate::{error::SearchLayerError, normalizer::escape_regex};

/// One side of a range fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeBound {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RangeBound {
    /// The operator name used in the store DSL.
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeBound::Gt => "gt",
            RangeBound::Gte => "gte",
            RangeBound::Lt => "lt",
            RangeBound::Lte => "lte",
        }
    }
}

/// A case-insensitive regular expression matched against a whole field value.
///
/// The body is stored unanchored; [`Pattern::anchored`] adds the `^...$` anchors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    body: String,
    case_insensitive: bool,
}

impl Pattern {
    fn new(body: String) -> Self {
        Self { body, case_insensitive: true }
    }

    /// Matches values containing `literal` anywhere.
    pub fn contains(literal: &str) -> Self {
        Self::new(format!(".*{}.*", escape_regex(literal)))
    }

    /// Matches values where every `%` of `pattern` stands for any run of characters.
    pub fn like(pattern: &str) -> Self {
        let body = pattern
            .split('%')
            .map(escape_regex)
            .collect::<Vec<_>>()
            .join(".*");

        Self::new(body)
    }

    /// Matches values starting with `literal`.
    pub fn starts_with(literal: &str) -> Self {
        Self::new(format!("{}.*", escape_regex(literal)))
    }

    /// Matches values ending with `literal`.
    pub fn ends_with(literal: &str) -> Self {
        Self::new(format!(".*{}", escape_regex(literal)))
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// The body wrapped in `^` and `$`.
    pub fn anchored(&self) -> String {
        format!("^{}$", self.body)
    }
}

/// A node of the compiled filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeFilter {
    /// Matches every document.
    MatchAll,
    /// The field equals the value.
    Term { field: String, value: Value },
    /// The field equals any of the values.
    Terms { field: String, values: Vec<Value> },
    /// The document identifier is one of the values, within the given type.
    Ids { values: Vec<Value>, type_name: Option<String> },
    /// The field satisfies every bound.
    Range { field: String, bounds: Vec<(RangeBound, Value)> },
    /// The field matches the pattern.
    Regexp { field: String, pattern: Pattern },
    Not(Box<NativeFilter>),
    And(Vec<NativeFilter>),
    Or(Vec<NativeFilter>),
    /// An unrecognized modifier forwarded to the store untouched.
    PassThrough { field: String, operator: String, value: Value },
}

impl NativeFilter {
    /// The DSL operator key of this fragment; two fragments with the same key collide when
    /// folded into one modifier map.
    pub fn operator_key(&self) -> &str {
        match self {
            NativeFilter::MatchAll => "match_all",
            NativeFilter::Term { .. } => "term",
            NativeFilter::Terms { .. } => "terms",
            NativeFilter::Ids { .. } => "ids",
            NativeFilter::Range { .. } => "range",
            NativeFilter::Regexp { .. } => "regexp",
            NativeFilter::Not(_) => "not",
            NativeFilter::And(_) => "and",
            NativeFilter::Or(_) => "or",
            NativeFilter::PassThrough { operator, .. } => operator,
        }
    }

    /// Returns `true` if this filter matches every document.
    pub fn is_match_all(&self) -> bool {
        matches!(self, NativeFilter::MatchAll)
    }

    /// Conjoins a list of filters, collapsing the trivial cases.
    pub fn all(mut filters: Vec<NativeFilter>) -> NativeFilter {
        match filters.len() {
            0 => NativeFilter::MatchAll,
            1 => filters.remove(0),
            _ => NativeFilter::And(filters),
        }
    }
}

/// Walks a [`NativeFilter`] tree, producing one output per node.
pub trait FilterVisitor {
    type Output;
    type Error: Into<SearchLayerError>;

    fn visit_match_all(&mut self) -> Result<Self::Output, Self::Error>;
    fn visit_term(&mut self, field: &str, value: &Value) -> Result<Self::Output, Self::Error>;
    fn visit_terms(&mut self, field: &str, values: &[Value]) -> Result<Self::Output, Self::Error>;
    fn visit_ids(
        &mut self,
        values: &[Value],
        type_name: Option<&str>,
    ) -> Result<Self::Output, Self::Error>;
    fn visit_range(
        &mut self,
        field: &str,
        bounds: &[(RangeBound, Value)],
    ) -> Result<Self::Output, Self::Error>;
    fn visit_regexp(&mut self, field: &str, pattern: &Pattern) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, filter: &NativeFilter) -> Result<Self::Output, Self::Error>;
    fn visit_and(&mut self, filters: &[NativeFilter]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, filters: &[NativeFilter]) -> Result<Self::Output, Self::Error>;
    fn visit_pass_through(
        &mut self,
        field: &str,
        operator: &str,
        value: &Value,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_filter(&mut self, filter: &NativeFilter) -> Result<Self::Output, Self::Error> {
        match filter {
            NativeFilter::MatchAll => self.visit_match_all(),
            NativeFilter::Term { field, value } => self.visit_term(field, value),
            NativeFilter::Terms { field, values } => self.visit_terms(field, values),
            NativeFilter::Ids { values, type_name } => self.visit_ids(values, type_name.as_deref()),
            NativeFilter::Range { field, bounds } => self.visit_range(field, bounds),
            NativeFilter::Regexp { field, pattern } => self.visit_regexp(field, pattern),
            NativeFilter::Not(filter) => self.visit_not(filter),
            NativeFilter::And(filters) => self.visit_and(filters),
            NativeFilter::Or(filters) => self.visit_or(filters),
            NativeFilter::PassThrough { field, operator, value } => {
                self.visit_pass_through(field, operator, value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_are_anchored_and_escaped() {
        assert_eq!(Pattern::contains("a.b").anchored(), r"^.*a\.b.*$");
        assert_eq!(Pattern::starts_with("(x)").anchored(), r"^\(x\).*$");
        assert_eq!(Pattern::ends_with("$5").anchored(), r"^.*\$5$");
        assert_eq!(Pattern::like("%foo+%bar").anchored(), r"^.*foo\+.*bar$");
        assert!(Pattern::like("x").case_insensitive());
    }

    #[test]
    fn test_all_collapses_trivial_lists() {
        assert_eq!(NativeFilter::all(vec![]), NativeFilter::MatchAll);

        let term = NativeFilter::Term { field: "a".to_string(), value: 1.into() };
        assert_eq!(NativeFilter::all(vec![term.clone()]), term);
        assert!(matches!(
            NativeFilter::all(vec![term.clone(), term]),
            NativeFilter::And(filters) if filters.len() == 2
        ));
    }
}
