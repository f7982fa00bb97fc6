//! Full parse → evaluate round trips, including the concrete scenarios
//! enumerated in the core spec's testable-properties section.

use serde_json::{json, Value as Json};
use style_expression::{parse_expression, EvaluationContext, Feature, ParsingContext, Type, Value};

fn parse_ok(value: Json, expected: Option<Type>) -> style_expression::Expr {
    let ctx = match expected {
        Some(t) => ParsingContext::root_with_expected(t),
        None => ParsingContext::new(),
    };
    parse_expression(&value, &ctx).unwrap_or_else(|| panic!("parse failed: {:?}", ctx.take_errors()))
}

fn parse_err(value: Json, expected: Option<Type>) -> Vec<style_expression::ParseError> {
    let ctx = match expected {
        Some(t) => ParsingContext::root_with_expected(t),
        None => ParsingContext::new(),
    };
    match parse_expression(&value, &ctx) {
        Some(_) => panic!("expected parse to fail, but it succeeded"),
        None => ctx.take_errors(),
    }
}

fn eval_ok(expr: &style_expression::Expr, ctx: &EvaluationContext<'_>) -> Value {
    expr.evaluate(ctx).expect("evaluation should not error")
}

#[test]
fn literal_five_evaluates_to_five_everywhere() {
    let expr = parse_ok(json!(["literal", 5]), Some(Type::Number));
    assert_eq!(eval_ok(&expr, &EvaluationContext::none()), Value::Number(5.0));
    let feature = Feature::new();
    assert_eq!(
        eval_ok(&expr, &EvaluationContext::feature_only(&feature)),
        Value::Number(5.0)
    );
}

#[test]
fn case_dispatches_on_feature_property() {
    let expr = parse_ok(
        json!(["case", ["==", ["get", "t"], "a"], 1, ["==", ["get", "t"], "b"], 2, 0]),
        Some(Type::Number),
    );
    assert!(!expr.is_feature_constant());
    assert!(expr.is_zoom_constant());

    let b = Feature::new().with_property("t", Value::String("b".to_string()));
    assert_eq!(
        eval_ok(&expr, &EvaluationContext::feature_only(&b)),
        Value::Number(2.0)
    );

    let z = Feature::new().with_property("t", Value::String("z".to_string()));
    assert_eq!(
        eval_ok(&expr, &EvaluationContext::feature_only(&z)),
        Value::Number(0.0)
    );
}

#[test]
fn match_dispatches_across_three_branches() {
    let expr = parse_ok(
        json!(["match", ["get", "n"], [1, 2], "low", [3], "mid", "hi"]),
        Some(Type::String),
    );
    for (n, expected) in [(2.0, "low"), (3.0, "mid"), (4.0, "hi")] {
        let feature = Feature::new().with_property("n", Value::Number(n));
        assert_eq!(
            eval_ok(&expr, &EvaluationContext::feature_only(&feature)),
            Value::String(expected.to_string())
        );
    }
}

#[test]
fn duplicate_match_label_across_branches_fails_parsing() {
    let errors = parse_err(
        json!(["match", ["get", "n"], [1, 2], "low", [2], "mid", "hi"]),
        Some(Type::String),
    );
    assert!(errors
        .iter()
        .any(|e| matches!(e.kind, style_expression::ParseErrorKind::DuplicateBranchLabel)));
}

#[test]
fn coalesce_falls_through_to_default_on_missing_property() {
    let expr = parse_ok(json!(["coalesce", ["get", "x"], 0]), Some(Type::Number));
    let feature = Feature::new();
    assert_eq!(
        eval_ok(&expr, &EvaluationContext::feature_only(&feature)),
        Value::Number(0.0)
    );
}

#[test]
fn non_ascending_curve_stops_fail_parsing() {
    let errors = parse_err(json!(["step", ["zoom"], 10, "a", 5, "b"]), Some(Type::String));
    assert!(errors
        .iter()
        .any(|e| matches!(e.kind, style_expression::ParseErrorKind::NonAscendingStops)));
}

#[test]
fn subtype_mismatch_fails_parse() {
    let errors = parse_err(json!("hello"), Some(Type::Number));
    assert!(errors
        .iter()
        .any(|e| matches!(e.kind, style_expression::ParseErrorKind::TypeMismatch { .. })));
}

#[test]
fn depth_limit_rejects_deeply_nested_coalesce() {
    let mut expr = json!(["literal", 0]);
    for _ in 0..300 {
        expr = json!(["coalesce", expr]);
    }
    let errors = parse_err(expr, None);
    assert!(!errors.is_empty());
}
