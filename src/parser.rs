//! The type-checked recursive-descent expression parser (§4.3, §4.4).
//!
//! `parse_expression` is the sole entry point; it is also the place the
//! declared-type/expected-type subtype check happens (§4.3: "After
//! constructing a node with declared type T, if the context had an
//! expected type E, run `check_subtype(E, T)`"), so every operator-specific
//! parser below just builds a node and lets the wrapper check it.

use std::collections::HashMap;

use serde_json::Value as Json;

use crate::context::ParsingContext;
use crate::curve::Interpolation;
use crate::error::{ParseError, ParseErrorKind};
use crate::expr::{Expr, MatchLabel};
use crate::operators::Operator;
use crate::value::{Type, Value};

/// Recursion depth beyond which parsing gives up rather than overflow the
/// call stack (§5: "recommended limit: 255").
const MAX_DEPTH: usize = 255;

pub fn parse_expression(value: &Json, ctx: &ParsingContext) -> Option<Expr> {
    if ctx.path.len() > MAX_DEPTH {
        ctx.error(ParseError::Malformed(
            "expression nesting exceeds the maximum depth of 255".to_string(),
        ));
        return None;
    }
    let node = parse_expression_inner(value, ctx)?;
    if let Some(expected) = &ctx.expected {
        let actual = node.type_of();
        if crate::value::check_subtype(expected, &actual).is_err() {
            ctx.error(ParseError::TypeMismatch(expected.clone(), actual));
            return None;
        }
    }
    Some(node)
}

fn parse_expression_inner(value: &Json, ctx: &ParsingContext) -> Option<Expr> {
    match value {
        Json::Array(arr) => parse_call(arr, ctx),
        Json::Object(_) => {
            ctx.error(ParseError::ExpectedExpression());
            None
        }
        scalar => Some(Expr::literal(Value::from_json(scalar))),
    }
}

fn parse_call(arr: &[Json], ctx: &ParsingContext) -> Option<Expr> {
    let Some(Json::String(op)) = arr.first() else {
        ctx.error(ParseError::ExpectedExpression());
        return None;
    };
    match op.as_str() {
        "literal" => parse_literal(arr, ctx),
        "coalesce" => parse_coalesce(arr, ctx),
        "case" => parse_case(arr, ctx),
        "match" => parse_match(arr, ctx),
        "step" => parse_step(arr, ctx),
        "interpolate" => parse_interpolate(arr, ctx),
        "array" => parse_array_assertion(arr, ctx),
        other => match Operator::from_name(other) {
            Some(operator) => parse_compound(operator, arr, ctx),
            None => {
                ctx.error(ParseError::UnknownOperator(other.to_string()));
                None
            }
        },
    }
}

fn parse_literal(arr: &[Json], ctx: &ParsingContext) -> Option<Expr> {
    if arr.len() != 2 {
        ctx.error(ParseError::ExpectedArguments("1".to_string(), arr.len() - 1));
        return None;
    }
    Some(Expr::literal(Value::from_json(&arr[1])))
}

fn parse_coalesce(arr: &[Json], ctx: &ParsingContext) -> Option<Expr> {
    let items = &arr[1..];
    if items.is_empty() {
        ctx.error(ParseError::ExpectedArguments("at least 1".to_string(), 0));
        return None;
    }
    let mut output_type = ctx.expected.clone();
    let mut children = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let child_ctx = ctx.child(i + 1, output_type.clone());
        let parsed = parse_expression(item, &child_ctx)?;
        if output_type.is_none() {
            output_type = Some(parsed.type_of());
        }
        children.push(parsed);
    }
    Some(Expr::coalesce(output_type.unwrap_or(Type::Value), children))
}

fn parse_case(arr: &[Json], ctx: &ParsingContext) -> Option<Expr> {
    if arr.len() < 4 || arr.len() % 2 != 0 {
        ctx.error(ParseError::ExpectedArguments(
            "an even number of, at least 3".to_string(),
            arr.len() - 1,
        ));
        return None;
    }
    let branch_count = (arr.len() - 2) / 2;
    let mut output_type = ctx.expected.clone();
    let mut branches = Vec::with_capacity(branch_count);
    let mut idx = 1;
    for _ in 0..branch_count {
        let test_ctx = ctx.child(idx, Some(Type::Boolean));
        let test = parse_expression(&arr[idx], &test_ctx)?;
        idx += 1;
        let body_ctx = ctx.child(idx, output_type.clone());
        let body = parse_expression(&arr[idx], &body_ctx)?;
        if output_type.is_none() {
            output_type = Some(body.type_of());
        }
        idx += 1;
        branches.push((test, body));
    }
    let otherwise_ctx = ctx.child(idx, output_type.clone());
    let otherwise = parse_expression(&arr[idx], &otherwise_ctx)?;
    Some(Expr::case(
        output_type.unwrap_or(Type::Value),
        branches,
        otherwise,
    ))
}

fn parse_match(arr: &[Json], ctx: &ParsingContext) -> Option<Expr> {
    if arr.len() < 5 || arr.len() % 2 == 0 {
        ctx.error(ParseError::ExpectedArguments(
            "an odd number of, at least 4".to_string(),
            arr.len() - 1,
        ));
        return None;
    }
    let input_ctx = ctx.child(1, None);
    let input = parse_expression(&arr[1], &input_ctx)?;

    let pair_count = (arr.len() - 3) / 2;
    let mut output_type = ctx.expected.clone();
    let mut bodies = Vec::with_capacity(pair_count);
    let mut lookup: HashMap<MatchLabel, usize> = HashMap::new();
    let mut key_is_string: Option<bool> = None;
    let mut idx = 2;

    for _ in 0..pair_count {
        let label_idx = idx;
        let labels_json: Vec<&Json> = match &arr[idx] {
            Json::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        if labels_json.is_empty() {
            ctx.child(label_idx, None)
                .error(ParseError::ExpectedAtLeastOneBranchLabel());
            return None;
        }

        let mut parsed_labels = Vec::with_capacity(labels_json.len());
        for label in labels_json {
            let label_ctx = ctx.child(label_idx, None);
            let parsed = match label {
                Json::Number(n) => {
                    let f = n.as_f64().unwrap_or(f64::NAN);
                    if key_is_string == Some(true) {
                        label_ctx.error(ParseError::Malformed(
                            "branch labels must all be the same type".to_string(),
                        ));
                        return None;
                    }
                    key_is_string = Some(false);
                    if !f.is_finite() || f.fract() != 0.0 {
                        label_ctx.error(ParseError::NonIntegerBranchLabel());
                        return None;
                    }
                    if f.abs() > crate::value::MAX_SAFE_INTEGER as f64 {
                        label_ctx.error(ParseError::BranchLabelTooLarge());
                        return None;
                    }
                    MatchLabel::Int(f as i64)
                }
                Json::String(s) => {
                    if key_is_string == Some(false) {
                        label_ctx.error(ParseError::Malformed(
                            "branch labels must all be the same type".to_string(),
                        ));
                        return None;
                    }
                    key_is_string = Some(true);
                    MatchLabel::Str(s.clone())
                }
                _ => {
                    label_ctx.error(ParseError::Malformed(
                        "branch labels must be numbers or strings".to_string(),
                    ));
                    return None;
                }
            };
            parsed_labels.push(parsed);
        }
        idx += 1;

        let body_ctx = ctx.child(idx, output_type.clone());
        let body = parse_expression(&arr[idx], &body_ctx)?;
        if output_type.is_none() {
            output_type = Some(body.type_of());
        }
        idx += 1;

        let body_index = bodies.len();
        bodies.push(body);
        for label in parsed_labels {
            if lookup.insert(label, body_index).is_some() {
                ctx.child(label_idx, None)
                    .error(ParseError::DuplicateBranchLabel());
                return None;
            }
        }
    }

    let otherwise_ctx = ctx.child(idx, output_type.clone());
    let otherwise = parse_expression(&arr[idx], &otherwise_ctx)?;

    Some(Expr::match_expr(
        output_type.unwrap_or(Type::Value),
        input,
        bodies,
        lookup,
        otherwise,
    ))
}

/// Shared by `step` and `interpolate`: parses the `(key, body)` stop pairs
/// that trail the input expression, pinning the output type to the first
/// body's type just like `case`/`match` do.
fn parse_stops(
    arr: &[Json],
    start: usize,
    ctx: &ParsingContext,
    mut output_type: Option<Type>,
) -> Option<(Vec<(f64, Expr)>, Type)> {
    let pair_count = (arr.len() - start) / 2;
    let mut stops = Vec::with_capacity(pair_count);
    let mut prev_key: Option<f64> = None;
    let mut idx = start;
    for _ in 0..pair_count {
        let key_ctx = ctx.child(idx, None);
        let key = match &arr[idx] {
            Json::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            _ => {
                key_ctx.error(ParseError::Malformed(
                    "stop key must be a number".to_string(),
                ));
                return None;
            }
        };
        if !key.is_finite() || prev_key.is_some_and(|p| key <= p) {
            key_ctx.error(ParseError::NonAscendingStops());
            return None;
        }
        prev_key = Some(key);
        idx += 1;

        let body_ctx = ctx.child(idx, output_type.clone());
        let body = parse_expression(&arr[idx], &body_ctx)?;
        if output_type.is_none() {
            output_type = Some(body.type_of());
        }
        idx += 1;
        stops.push((key, body));
    }
    if stops.is_empty() {
        ctx.error(ParseError::EmptyStops());
        return None;
    }
    Some((stops, output_type.unwrap_or(Type::Value)))
}

fn parse_step(arr: &[Json], ctx: &ParsingContext) -> Option<Expr> {
    if arr.len() < 4 || arr.len() % 2 != 0 {
        ctx.error(ParseError::ExpectedArguments(
            "an input and at least one (key, output) pair".to_string(),
            arr.len() - 1,
        ));
        return None;
    }
    let input_ctx = ctx.child(1, Some(Type::Number));
    let input = parse_expression(&arr[1], &input_ctx)?;
    let (stops, output_type) = parse_stops(arr, 2, ctx, ctx.expected.clone())?;
    Some(Expr::curve(output_type, input, Interpolation::Step, stops))
}

fn parse_interpolation_kind(value: &Json, ctx: &ParsingContext) -> Option<Interpolation> {
    let Json::Array(descriptor) = value else {
        ctx.error(ParseError::Malformed(
            "interpolation type must be [\"linear\"], [\"exponential\", base], or \
             [\"cubic-bezier\", x1, y1, x2, y2]"
                .to_string(),
        ));
        return None;
    };
    match descriptor.first().and_then(Json::as_str) {
        Some("linear") => Some(Interpolation::Exponential { base: 1.0 }),
        Some("exponential") => {
            let base = descriptor.get(1).and_then(Json::as_f64).unwrap_or(1.0);
            Some(Interpolation::Exponential { base })
        }
        // Cubic-bezier easing is a rendering-time concern out of this
        // core's scope (§4.4); collapse it to a linear exponential curve.
        Some("cubic-bezier") => Some(Interpolation::Exponential { base: 1.0 }),
        _ => {
            ctx.error(ParseError::Malformed(
                "unknown interpolation type".to_string(),
            ));
            None
        }
    }
}

fn parse_interpolate(arr: &[Json], ctx: &ParsingContext) -> Option<Expr> {
    if arr.len() < 5 || arr.len() % 2 != 1 {
        ctx.error(ParseError::ExpectedArguments(
            "an interpolation type, an input, and at least one (key, output) pair".to_string(),
            arr.len() - 1,
        ));
        return None;
    }
    let kind_ctx = ctx.child(1, None);
    let interpolation = parse_interpolation_kind(&arr[1], &kind_ctx)?;
    let input_ctx = ctx.child(2, Some(Type::Number));
    let input = parse_expression(&arr[2], &input_ctx)?;
    let (stops, output_type) = parse_stops(arr, 3, ctx, ctx.expected.clone())?;
    if !matches!(interpolation, Interpolation::Step) && !crate::curve::is_interpolable(&output_type)
    {
        ctx.error(ParseError::Malformed(format!(
            "type {output_type} is not interpolable; expected number, color, or a fixed-length \
             numeric array"
        )));
        return None;
    }
    Some(Expr::curve(output_type, input, interpolation, stops))
}

fn parse_item_type(name: &str) -> Option<Type> {
    match name {
        "number" => Some(Type::Number),
        "string" => Some(Type::String),
        "boolean" => Some(Type::Boolean),
        "value" => Some(Type::Value),
        _ => None,
    }
}

fn parse_array_assertion(arr: &[Json], ctx: &ParsingContext) -> Option<Expr> {
    let (item_type, length, child_idx) = match arr.len() {
        2 => (Type::Value, None, 1),
        3 => {
            let name_ctx = ctx.child(1, None);
            let name = arr[1].as_str().unwrap_or("");
            let item_type = parse_item_type(name).or_else(|| {
                name_ctx.error(ParseError::Malformed(format!(
                    "unknown array item type \"{name}\""
                )));
                None
            })?;
            (item_type, None, 2)
        }
        4 => {
            let name_ctx = ctx.child(1, None);
            let name = arr[1].as_str().unwrap_or("");
            let item_type = parse_item_type(name).or_else(|| {
                name_ctx.error(ParseError::Malformed(format!(
                    "unknown array item type \"{name}\""
                )));
                None
            })?;
            let len_ctx = ctx.child(2, None);
            let length = arr[2].as_u64().or_else(|| {
                len_ctx.error(ParseError::Malformed(
                    "array length must be a non-negative integer".to_string(),
                ));
                None
            })? as usize;
            (item_type, Some(length), 3)
        }
        _ => {
            ctx.error(ParseError::ExpectedArguments(
                "1-3".to_string(),
                arr.len() - 1,
            ));
            return None;
        }
    };
    let child_ctx = ctx.child(child_idx, None);
    let child = parse_expression(&arr[child_idx], &child_ctx)?;
    Some(Expr::array_assertion(item_type, length, child))
}

fn parse_compound(operator: Operator, arr: &[Json], ctx: &ParsingContext) -> Option<Expr> {
    let args_json = &arr[1..];
    if !operator.arity().accepts(args_json.len()) {
        ctx.error(ParseError::ExpectedArguments(
            operator.arity().describe(),
            args_json.len(),
        ));
        return None;
    }
    let mut args = Vec::with_capacity(args_json.len());
    for (i, arg) in args_json.iter().enumerate() {
        let child_ctx = ctx.child(i + 1, Some(operator.param_type(i)));
        args.push(parse_expression(arg, &child_ctx)?);
    }
    Some(Expr::compound(operator, operator.result_type(), args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{EvaluationContext, Feature};
    use serde_json::json;

    fn parse(value: Json, expected: Option<Type>) -> Result<Expr, Vec<ParseError>> {
        let ctx = match expected {
            Some(t) => ParsingContext::root_with_expected(t),
            None => ParsingContext::new(),
        };
        match parse_expression(&value, &ctx) {
            Some(expr) => Ok(expr),
            None => Err(ctx.take_errors()),
        }
    }

    #[test]
    fn literal_with_expected_number() {
        let expr = parse(json!(["literal", 5]), Some(Type::Number)).unwrap();
        let ctx = EvaluationContext::none();
        assert_eq!(expr.evaluate(&ctx).unwrap(), Value::Number(5.0));
    }

    #[test]
    fn bare_scalar_is_implicit_literal() {
        let expr = parse(json!(5), None).unwrap();
        assert_eq!(expr.type_of(), Type::Number);
    }

    #[test]
    fn unknown_operator_is_reported() {
        let errors = parse(json!(["nope", 1]), None).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            *errors[0],
            ParseErrorKind::UnknownOperator { ref operator } if operator == "nope"
        ));
    }

    #[test]
    fn case_classifies_constancy_and_evaluates() {
        let expr = parse(
            json!(["case", ["==", ["get", "t"], "a"], 1, ["==", ["get", "t"], "b"], 2, 0]),
            Some(Type::Number),
        )
        .unwrap();
        assert!(!expr.is_feature_constant());
        assert!(expr.is_zoom_constant());

        let feature = Feature::new().with_property("t", Value::String("b".to_string()));
        let ctx = EvaluationContext::feature_only(&feature);
        assert_eq!(expr.evaluate(&ctx).unwrap(), Value::Number(2.0));

        let feature = Feature::new().with_property("t", Value::String("z".to_string()));
        let ctx = EvaluationContext::feature_only(&feature);
        assert_eq!(expr.evaluate(&ctx).unwrap(), Value::Number(0.0));
    }

    #[test]
    fn match_branches_and_duplicate_labels() {
        let expr = parse(
            json!(["match", ["get", "n"], [1, 2], "low", [3], "mid", "hi"]),
            Some(Type::String),
        )
        .unwrap();

        let f2 = Feature::new().with_property("n", Value::Number(2.0));
        assert_eq!(
            expr.evaluate(&EvaluationContext::feature_only(&f2)).unwrap(),
            Value::String("low".to_string())
        );
        let f3 = Feature::new().with_property("n", Value::Number(3.0));
        assert_eq!(
            expr.evaluate(&EvaluationContext::feature_only(&f3)).unwrap(),
            Value::String("mid".to_string())
        );
        let f4 = Feature::new().with_property("n", Value::Number(4.0));
        assert_eq!(
            expr.evaluate(&EvaluationContext::feature_only(&f4)).unwrap(),
            Value::String("hi".to_string())
        );

        let dup = parse(
            json!(["match", ["get", "n"], [1, 2], "low", [2], "mid", "hi"]),
            Some(Type::String),
        );
        let errors = dup.unwrap_err();
        assert!(matches!(*errors[0], ParseErrorKind::DuplicateBranchLabel));
    }

    #[test]
    fn coalesce_requires_at_least_one_argument() {
        let errors = parse(json!(["coalesce"]), None).unwrap_err();
        assert!(matches!(*errors[0], ParseErrorKind::ExpectedArguments { .. }));
    }

    #[test]
    fn non_ascending_stops_are_rejected() {
        let errors = parse(
            json!(["step", ["zoom"], 10, "a", 5, "b"]),
            Some(Type::String),
        )
        .unwrap_err();
        assert!(matches!(*errors[0], ParseErrorKind::NonAscendingStops));
    }

    #[test]
    fn interpolate_exponential_curve_evaluates() {
        let expr = parse(
            json!(["interpolate", ["exponential", 1], ["zoom"], 0, 0, 10, 100]),
            Some(Type::Number),
        )
        .unwrap();
        let ctx = EvaluationContext::zoom_only(5.0);
        assert_eq!(expr.evaluate(&ctx).unwrap(), Value::Number(50.0));
    }

    #[test]
    fn array_assertion_parses_all_forms() {
        let plain = parse(json!(["array", ["get", "v"]]), None).unwrap();
        assert_eq!(plain.type_of(), Type::array(Type::Value));

        let typed = parse(json!(["array", "number", ["get", "v"]]), None).unwrap();
        assert_eq!(typed.type_of(), Type::array(Type::Number));

        let fixed = parse(json!(["array", "number", 2, ["get", "v"]]), None).unwrap();
        assert_eq!(fixed.type_of(), Type::array_of_length(Type::Number, 2));
    }

    #[test]
    fn type_mismatch_reports_expected_and_found() {
        let errors = parse(json!("hello"), Some(Type::Number)).unwrap_err();
        assert!(matches!(
            *errors[0],
            ParseErrorKind::TypeMismatch { .. }
        ));
    }

    #[test]
    fn object_literal_is_rejected() {
        let errors = parse(json!({"a": 1}), None).unwrap_err();
        assert!(matches!(*errors[0], ParseErrorKind::ExpectedExpression));
    }
}
