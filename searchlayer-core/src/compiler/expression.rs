//! Compilation of one field-scoped expression into a native filter fragment.

use serde_json::Value;

use crate::{
    criteria::{Expression, Modifier, is_truthy},
    native::{NativeFilter, Pattern, RangeBound},
    normalizer::coerce_value,
    schema::{ID_FIELD, INTERNAL_ID_FIELD, Schema},
};

/// Compiles the expression applied to `field`.
///
/// Literals compile to equality, lists to membership. On the identifier field both become an
/// identifier lookup scoped to `type_name`, and a falsy literal there matches everything.
/// Modifier maps compile one fragment per modifier and fold them (see [`fold_fragments`]).
pub fn parse_expression(
    field: &str,
    expression: &Expression,
    schema: &Schema,
    type_name: &str,
) -> NativeFilter {
    match expression {
        Expression::Literal(value) => parse_equality(field, value, schema, type_name),
        Expression::List(values) => parse_membership(field, values, schema, type_name),
        Expression::Modifiers(modifiers) => fold_fragments(
            modifiers
                .iter()
                .map(|modifier| parse_modifier(field, modifier, schema, type_name))
                .collect(),
        ),
    }
}

fn is_id_field(field: &str) -> bool {
    field == ID_FIELD || field == INTERNAL_ID_FIELD
}

fn parse_equality(field: &str, value: &Value, schema: &Schema, type_name: &str) -> NativeFilter {
    let value = coerce_value(schema, field, value);

    if !is_id_field(field) {
        return NativeFilter::Term { field: field.to_string(), value };
    }

    if is_truthy(&value) {
        NativeFilter::Ids { values: vec![value], type_name: Some(type_name.to_string()) }
    } else {
        NativeFilter::MatchAll
    }
}

fn parse_membership(field: &str, values: &[Value], schema: &Schema, type_name: &str) -> NativeFilter {
    let values = values
        .iter()
        .map(|value| coerce_value(schema, field, value))
        .collect();

    if is_id_field(field) {
        NativeFilter::Ids { values, type_name: Some(type_name.to_string()) }
    } else {
        NativeFilter::Terms { field: field.to_string(), values }
    }
}

fn parse_modifier(field: &str, modifier: &Modifier, schema: &Schema, type_name: &str) -> NativeFilter {
    let range = |bound: RangeBound, value: &Value| NativeFilter::Range {
        field: field.to_string(),
        bounds: vec![(bound, coerce_value(schema, field, value))],
    };

    let regexp = |operator: &str, value: &Value, pattern: fn(&str) -> Pattern| match value {
        Value::String(text) => NativeFilter::Regexp { field: field.to_string(), pattern: pattern(text) },
        _ => NativeFilter::PassThrough {
            field: field.to_string(),
            operator: operator.to_string(),
            value: coerce_value(schema, field, value),
        },
    };

    match modifier {
        Modifier::Not(inner) => NativeFilter::Not(Box::new(parse_expression(field, inner, schema, type_name))),
        Modifier::LessThan(value) => range(RangeBound::Lt, value),
        Modifier::LessThanOrEqual(value) => range(RangeBound::Lte, value),
        Modifier::GreaterThan(value) => range(RangeBound::Gt, value),
        Modifier::GreaterThanOrEqual(value) => range(RangeBound::Gte, value),
        Modifier::Contains(value) => regexp("contains", value, Pattern::contains),
        Modifier::Like(value) => regexp("like", value, Pattern::like),
        Modifier::StartsWith(value) => regexp("startsWith", value, Pattern::starts_with),
        Modifier::EndsWith(value) => regexp("endsWith", value, Pattern::ends_with),
        Modifier::Other(operator, value) => NativeFilter::PassThrough {
            field: field.to_string(),
            operator: operator.clone(),
            value: coerce_value(schema, field, value),
        },
    }
}

/// Folds the fragments of one modifier map into a single fragment.
///
/// Range fragments merge their bounds, a repeated bound keeping the last value. Any other
/// fragment replaces an earlier one with the same operator key.
pub(crate) fn fold_fragments(fragments: Vec<NativeFilter>) -> NativeFilter {
    let mut folded: Vec<NativeFilter> = Vec::with_capacity(fragments.len());

    for fragment in fragments {
        let existing = folded
            .iter_mut()
            .find(|candidate| candidate.operator_key() == fragment.operator_key());

        match (existing, fragment) {
            (Some(NativeFilter::Range { bounds, .. }), NativeFilter::Range { bounds: added, .. }) => {
                for (bound, value) in added {
                    match bounds.iter_mut().find(|(existing, _)| *existing == bound) {
                        Some(slot) => slot.1 = value,
                        None => bounds.push((bound, value)),
                    }
                }
            }
            (Some(slot), fragment) => *slot = fragment,
            (None, fragment) => folded.push(fragment),
        }
    }

    NativeFilter::all(folded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeType};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new()
            .with("age", Attribute::new(AttributeType::Integer))
            .with("name", Attribute::new(AttributeType::String))
    }

    fn compile(field: &str, value: Value) -> NativeFilter {
        parse_expression(field, &Expression::from_value(value), &schema(), "user")
    }

    #[test]
    fn test_equality_and_membership() {
        assert_eq!(
            compile("age", json!("42")),
            NativeFilter::Term { field: "age".to_string(), value: json!(42) }
        );
        assert_eq!(
            compile("age", json!(["1", 2])),
            NativeFilter::Terms { field: "age".to_string(), values: vec![json!(1), json!(2)] }
        );
        assert_eq!(
            compile("name", json!("42")),
            NativeFilter::Term { field: "name".to_string(), value: json!("42") }
        );
    }

    #[test]
    fn test_identifier_lookup() {
        assert_eq!(
            compile("id", json!("abc")),
            NativeFilter::Ids { values: vec![json!("abc")], type_name: Some("user".to_string()) }
        );
        assert_eq!(
            compile("_id", json!(["a", "b"])),
            NativeFilter::Ids { values: vec![json!("a"), json!("b")], type_name: Some("user".to_string()) }
        );
        assert_eq!(compile("id", Value::Null), NativeFilter::MatchAll);
        assert_eq!(compile("id", json!(0)), NativeFilter::MatchAll);
        assert_eq!(compile("id", json!("")), NativeFilter::MatchAll);
    }

    #[test]
    fn test_not_modifier() {
        assert_eq!(
            compile("name", json!({ "!": "bob" })),
            NativeFilter::Not(Box::new(NativeFilter::Term { field: "name".to_string(), value: json!("bob") }))
        );
        assert_eq!(
            compile("age", json!({ "not": { ">": "3" } })),
            NativeFilter::Not(Box::new(NativeFilter::Range {
                field: "age".to_string(),
                bounds: vec![(RangeBound::Gt, json!(3))],
            }))
        );
    }

    #[test]
    fn test_range_bounds_merge() {
        assert_eq!(
            compile("age", json!({ ">=": 18, "lessThan": 65, "GT": 20 })),
            NativeFilter::Range {
                field: "age".to_string(),
                bounds: vec![(RangeBound::Gte, json!(18)), (RangeBound::Lt, json!(65)), (RangeBound::Gt, json!(20))],
            }
        );
        assert_eq!(
            compile("age", json!({ ">": 1, "gt": 5 })),
            NativeFilter::Range { field: "age".to_string(), bounds: vec![(RangeBound::Gt, json!(5))] }
        );
    }

    #[test]
    fn test_string_modifiers_escape_metacharacters() {
        let NativeFilter::Regexp { pattern, .. } = compile("name", json!({ "contains": "a.b" })) else {
            panic!("expected a regexp fragment");
        };
        assert_eq!(pattern.anchored(), r"^.*a\.b.*$");

        let NativeFilter::Regexp { pattern, .. } = compile("name", json!({ "like": "J%n" })) else {
            panic!("expected a regexp fragment");
        };
        assert_eq!(pattern.anchored(), "^J.*n$");
    }

    #[test]
    fn test_colliding_string_modifiers_keep_last() {
        let NativeFilter::Regexp { pattern, .. } =
            compile("name", json!({ "startsWith": "a", "endsWith": "z" }))
        else {
            panic!("expected a single regexp fragment");
        };
        assert_eq!(pattern.anchored(), "^.*z$");
    }

    #[test]
    fn test_non_textual_string_modifier_and_unknown_keys_pass_through() {
        assert_eq!(
            compile("age", json!({ "contains": 4 })),
            NativeFilter::PassThrough { field: "age".to_string(), operator: "contains".to_string(), value: json!(4) }
        );
        assert_eq!(
            compile("age", json!({ "exists": "true" })),
            NativeFilter::PassThrough { field: "age".to_string(), operator: "exists".to_string(), value: json!("true") }
        );
    }

    #[test]
    fn test_mixed_modifiers_are_conjoined() {
        let filter = compile("age", json!({ ">": 1, "not": 3 }));
        assert!(matches!(filter, NativeFilter::And(ref parts) if parts.len() == 2));
    }
}
