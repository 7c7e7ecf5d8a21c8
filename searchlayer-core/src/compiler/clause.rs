//! Compilation of where-clauses into filter trees.

use crate::{
    compiler::expression::parse_expression,
    criteria::Clause,
    native::NativeFilter,
    schema::Schema,
};

/// Compiles a clause into a filter tree.
///
/// Field pairs of one map are conjoined. `and`/`or` nodes keep their combinator.
pub fn parse_clause(clause: &Clause, schema: &Schema, type_name: &str) -> NativeFilter {
    match clause {
        Clause::Fields(fields) => NativeFilter::all(
            fields
                .iter()
                .map(|(field, expression)| parse_expression(field, expression, schema, type_name))
                .collect(),
        ),
        Clause::And(clauses) => NativeFilter::And(parse_clauses(clauses, schema, type_name)),
        Clause::Or(clauses) => NativeFilter::Or(parse_clauses(clauses, schema, type_name)),
        Clause::All(clauses) => NativeFilter::all(parse_clauses(clauses, schema, type_name)),
    }
}

fn parse_clauses(clauses: &[Clause], schema: &Schema, type_name: &str) -> Vec<NativeFilter> {
    clauses
        .iter()
        .map(|clause| parse_clause(clause, schema, type_name))
        .collect()
}

/// Compiles an optional where-clause.
///
/// A missing where-clause, or one holding nothing but a falsy identifier, matches everything.
pub fn parse_where(clause: Option<&Clause>, schema: &Schema, type_name: &str) -> NativeFilter {
    match clause {
        None => NativeFilter::MatchAll,
        Some(clause) if clause.is_falsy_id() => NativeFilter::MatchAll,
        Some(clause) => parse_clause(clause, schema, type_name),
    }
}
