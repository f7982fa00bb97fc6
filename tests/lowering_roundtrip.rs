//! Round-trip property from the core spec: lowering a legacy stops function
//! produces a tree that evaluates the same way the original stops function
//! would have, and classifies into the function kind the stops shape
//! implies (zoom-only stops without a property are camera functions;
//! property-driven stops are source functions).

use style_expression::feature::{EvaluationContext, Feature};
use style_expression::lowering::{
    lower, CategoricalKey, CategoricalStops, ExponentialStops, IdentityStops, IntervalStops,
    StopFunction,
};
use style_expression::property::{classify, PropertyValue};
use style_expression::value::{Type, Value};

#[test]
fn exponential_stops_interpolate_between_bracketing_keys() {
    let fun = StopFunction::Exponential(ExponentialStops {
        property: Some("p".to_string()),
        base: 1.0,
        stops: vec![(0.0, Value::Number(0.0)), (10.0, Value::Number(100.0))],
        output_type: Type::Number,
        default: None,
    });
    let tree = lower(&fun);
    let feature = Feature::new().with_property("p", Value::Number(5.0));
    let result = tree.evaluate(&EvaluationContext::feature_only(&feature)).unwrap();
    assert_eq!(result, Value::Number(50.0));

    match classify(tree).unwrap() {
        PropertyValue::Source(_) => {}
        other => panic!("expected a source function, got {other:?}"),
    }
}

#[test]
fn exponential_stops_without_property_classify_as_camera() {
    let fun = StopFunction::Exponential(ExponentialStops {
        property: None,
        base: 2.0,
        stops: vec![(0.0, Value::Number(1.0)), (10.0, Value::Number(4.0))],
        output_type: Type::Number,
        default: None,
    });
    let tree = lower(&fun);
    match classify(tree).unwrap() {
        PropertyValue::Camera(_) => {}
        other => panic!("expected a camera function, got {other:?}"),
    }
}

#[test]
fn interval_stops_step_at_each_boundary() {
    let fun = StopFunction::Interval(IntervalStops {
        property: None,
        stops: vec![
            (0.0, Value::String("small".to_string())),
            (10.0, Value::String("big".to_string())),
        ],
        output_type: Type::String,
        default: None,
    });
    let tree = lower(&fun);
    assert_eq!(
        tree.evaluate(&EvaluationContext::zoom_only(9.9)).unwrap(),
        Value::String("small".to_string())
    );
    assert_eq!(
        tree.evaluate(&EvaluationContext::zoom_only(10.0)).unwrap(),
        Value::String("big".to_string())
    );
}

#[test]
fn categorical_stops_lower_by_label_kind() {
    let string_fun = StopFunction::Categorical(CategoricalStops {
        property: "kind".to_string(),
        stops: vec![
            (CategoricalKey::String("a".to_string()), Value::Number(1.0)),
            (CategoricalKey::String("b".to_string()), Value::Number(2.0)),
        ],
        output_type: Type::Number,
        default: Some(Value::Number(-1.0)),
    });
    let tree = lower(&string_fun);
    let matched = Feature::new().with_property("kind", Value::String("b".to_string()));
    assert_eq!(
        tree.evaluate(&EvaluationContext::feature_only(&matched)).unwrap(),
        Value::Number(2.0)
    );
    let unmatched = Feature::new().with_property("kind", Value::String("z".to_string()));
    assert_eq!(
        tree.evaluate(&EvaluationContext::feature_only(&unmatched)).unwrap(),
        Value::Number(-1.0)
    );
}

#[test]
fn identity_stops_array_recovers_default_via_coalesce_catch() {
    let fun = StopFunction::Identity(IdentityStops {
        property: "v".to_string(),
        value_type: Type::array_of_length(Type::Number, 2),
        default: Some(Value::Array(vec![Value::Number(0.0), Value::Number(0.0)])),
    });
    let tree = lower(&fun);

    let good = Feature::new().with_property(
        "v",
        Value::Array(vec![Value::Number(3.0), Value::Number(4.0)]),
    );
    assert_eq!(
        tree.evaluate(&EvaluationContext::feature_only(&good)).unwrap(),
        Value::Array(vec![Value::Number(3.0), Value::Number(4.0)])
    );

    let bad = Feature::new().with_property("v", Value::String("oops".to_string()));
    assert_eq!(
        tree.evaluate(&EvaluationContext::feature_only(&bad)).unwrap(),
        Value::Array(vec![Value::Number(0.0), Value::Number(0.0)])
    );
}

#[test]
fn lowering_never_fails_to_parse_constancy_flags() {
    // A lowered tree must answer its own constancy predicates without
    // panicking, regardless of which stop kind produced it.
    let identity = lower(&StopFunction::Identity(IdentityStops {
        property: "p".to_string(),
        value_type: Type::String,
        default: None,
    }));
    assert!(!identity.is_feature_constant());
    assert!(identity.is_zoom_constant());
}
