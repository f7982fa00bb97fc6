//! The JSON-shape dispatch from the core spec's external-interfaces section:
//! undefined / scalar / `{"expression": ...}` / legacy stops (with and
//! without a `property` key), each routed to the right `PropertyValue`
//! variant.

use serde_json::json;
use style_expression::property::{from_json, PropertyValue};
use style_expression::value::{Type, Value};

#[test]
fn absent_value_is_undefined() {
    let result = from_json(None, Type::Number).unwrap();
    assert!(matches!(result, PropertyValue::Undefined));
}

#[test]
fn bare_scalar_is_a_constant() {
    let result = from_json(Some(&json!("#ff0000")), Type::Color).unwrap();
    assert!(matches!(result, PropertyValue::Constant(Value::Color(_))));
}

#[test]
fn wrapped_expression_is_parsed_and_classified() {
    let input = json!({"expression": ["interpolate", ["linear"], ["zoom"], 0, 1, 10, 2]});
    let result = from_json(Some(&input), Type::Number).unwrap();
    assert!(matches!(result, PropertyValue::Camera(_)));
}

#[test]
fn constant_expression_is_evaluated_eagerly() {
    let input = json!({"expression": ["+", 1, 2]});
    let result = from_json(Some(&input), Type::Number).unwrap();
    match result {
        PropertyValue::Constant(Value::Number(n)) => assert_eq!(n, 3.0),
        other => panic!("expected a constant 3, got {other:?}"),
    }
}

#[test]
fn legacy_stops_without_property_key_is_camera() {
    let input = json!({"stops": [[0, 1], [10, 100]], "base": 1});
    let result = from_json(Some(&input), Type::Number).unwrap();
    assert!(matches!(result, PropertyValue::Camera(_)));
}

#[test]
fn legacy_stops_with_property_key_is_source() {
    let input = json!({"property": "p", "stops": [[0, 1], [10, 100]]});
    let result = from_json(Some(&input), Type::Number).unwrap();
    assert!(matches!(result, PropertyValue::Source(_)));
}

#[test]
fn legacy_identity_without_property_key_is_an_error() {
    let input = json!({"type": "identity"});
    let errors = from_json(Some(&input), Type::Number).unwrap_err();
    assert!(!errors.is_empty());
}

#[test]
fn legacy_categorical_boolean_stops_round_trip() {
    let input = json!({
        "type": "categorical",
        "property": "big",
        "stops": [[true, 10], [false, 1]],
    });
    let result = from_json(Some(&input), Type::Number).unwrap();
    assert!(matches!(result, PropertyValue::Source(_)));
}
