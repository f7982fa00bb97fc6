//! Property-value dispatch (§4.7, §6): classifying a parsed expression as
//! constant/camera/source/composite, and the thin JSON-shape dispatch a
//! surrounding style-layer subsystem would call into (out of scope per
//! §1 beyond this dispatch — see DESIGN.md for what was deliberately left
//! out of the legacy-function JSON shapes).

use serde_json::Value as Json;

use crate::context::ParsingContext;
use crate::error::{EvalError, ParseError};
use crate::expr::Expr;
use crate::feature::EvaluationContext;
use crate::lowering::{
    self, CategoricalKey, CategoricalStops, ExponentialStops, IdentityStops, IntervalStops,
    StopFunction,
};
use crate::parser::parse_expression;
use crate::value::{Type, Value};

/// The classification of a parsed expression tree (§4.7), or the absence
/// of a property value at all (§6: "undefined → undefined property
/// value").
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Undefined,
    /// Both feature- and zoom-constant: the tree was evaluated once, up
    /// front, against a context with no zoom or feature access.
    Constant(Value),
    /// Feature-constant, not zoom-constant: a function of zoom only.
    Camera(Expr),
    /// Zoom-constant, not feature-constant: a function of feature data only.
    Source(Expr),
    /// Neither constant: depends on both zoom and feature data.
    Composite(Expr),
}

/// Classify a parsed expression (§4.7).
pub fn classify(expr: Expr) -> Result<PropertyValue, EvalError> {
    match (expr.is_feature_constant(), expr.is_zoom_constant()) {
        (true, true) => {
            let ctx = EvaluationContext::none();
            let value = expr.evaluate(&ctx)?;
            Ok(PropertyValue::Constant(value))
        }
        (true, false) => Ok(PropertyValue::Camera(expr)),
        (false, true) => Ok(PropertyValue::Source(expr)),
        (false, false) => Ok(PropertyValue::Composite(expr)),
    }
}

/// The top-level JSON-shape dispatch from §6. `output_type` is the
/// property's declared type, threaded in as the root parsing context's
/// expected type.
pub fn from_json(
    value: Option<&Json>,
    output_type: Type,
) -> Result<PropertyValue, Vec<ParseError>> {
    let Some(value) = value else {
        return Ok(PropertyValue::Undefined);
    };

    match value {
        Json::Object(map) => {
            if let Some(expr_json) = map.get("expression") {
                let ctx = ParsingContext::root_with_expected(output_type);
                return match parse_expression(expr_json, &ctx) {
                    Some(expr) => {
                        classify(expr).map_err(|e| vec![ParseError::Malformed(e.to_string())])
                    }
                    None => Err(ctx.take_errors()),
                };
            }
            let function = parse_legacy_function(map, &output_type)?;
            let expr = lowering::lower(&function);
            classify(expr).map_err(|e| vec![ParseError::Malformed(e.to_string())])
        }
        Json::Array(_) => {
            // A bare array with no enclosing `{"expression": ...}` wrapper
            // is not a recognized property-value shape at this layer.
            Err(vec![ParseError::Malformed(
                "expected a scalar, or an object with an \"expression\" or \"stops\" key"
                    .to_string(),
            )])
        }
        scalar => scalar_to_value(scalar, &output_type)
            .map(PropertyValue::Constant)
            .map_err(|e| vec![e]),
    }
}

/// The "T-specific scalar converter" from §6: most types round-trip through
/// [`Value::from_json`] directly, but `Color` has no native JSON
/// representation and must be parsed from its CSS string form.
fn scalar_to_value(scalar: &Json, output_type: &Type) -> Result<Value, ParseError> {
    if *output_type == Type::Color {
        let text = scalar.as_str().ok_or_else(|| {
            ParseError::Malformed(format!("expected a color string, but found {scalar}"))
        })?;
        return crate::color::Color::parse(text)
            .map(Value::Color)
            .ok_or_else(|| ParseError::InvalidColor(text.to_string()));
    }
    Ok(Value::from_json(scalar))
}

fn parse_legacy_function(
    map: &serde_json::Map<String, Json>,
    output_type: &Type,
) -> Result<StopFunction, Vec<ParseError>> {
    let property = map.get("property").and_then(Json::as_str).map(String::from);
    let default = map.get("default").map(Value::from_json);
    let kind = map.get("type").and_then(Json::as_str).unwrap_or("exponential");

    if kind == "identity" {
        let property = property.ok_or_else(|| {
            vec![ParseError::Malformed(
                "identity functions require a \"property\" key".to_string(),
            )]
        })?;
        return Ok(StopFunction::Identity(IdentityStops {
            property,
            value_type: output_type.clone(),
            default,
        }));
    }

    let stops_json = map.get("stops").and_then(Json::as_array).ok_or_else(|| {
        vec![ParseError::Malformed(
            "stop functions require a \"stops\" array".to_string(),
        )]
    })?;
    if stops_json.is_empty() {
        return Err(vec![ParseError::EmptyStops()]);
    }

    if kind == "categorical" {
        let property = property.ok_or_else(|| {
            vec![ParseError::Malformed(
                "categorical functions require a \"property\" key".to_string(),
            )]
        })?;
        let mut stops = Vec::with_capacity(stops_json.len());
        for entry in stops_json {
            let pair = entry.as_array().filter(|p| p.len() == 2).ok_or_else(|| {
                vec![ParseError::Malformed(
                    "each stop must be a [key, value] pair".to_string(),
                )]
            })?;
            let key = match &pair[0] {
                Json::Bool(b) => CategoricalKey::Boolean(*b),
                Json::Number(n) => CategoricalKey::Integer(n.as_i64().unwrap_or(0)),
                Json::String(s) => CategoricalKey::String(s.clone()),
                _ => {
                    return Err(vec![ParseError::Malformed(
                        "categorical stop keys must be boolean, integer, or string".to_string(),
                    )])
                }
            };
            stops.push((key, Value::from_json(&pair[1])));
        }
        return Ok(StopFunction::Categorical(CategoricalStops {
            property,
            stops,
            output_type: output_type.clone(),
            default,
        }));
    }

    let mut stops = Vec::with_capacity(stops_json.len());
    for entry in stops_json {
        let pair = entry.as_array().filter(|p| p.len() == 2).ok_or_else(|| {
            vec![ParseError::Malformed(
                "each stop must be a [key, value] pair".to_string(),
            )]
        })?;
        let key = pair[0].as_f64().ok_or_else(|| {
            vec![ParseError::Malformed(
                "exponential/interval stop keys must be numbers".to_string(),
            )]
        })?;
        stops.push((key, Value::from_json(&pair[1])));
    }
    stops.sort_by(|a, b| a.0.total_cmp(&b.0));

    if kind == "interval" {
        Ok(StopFunction::Interval(IntervalStops {
            property,
            stops,
            output_type: output_type.clone(),
            default,
        }))
    } else {
        let base = map.get("base").and_then(Json::as_f64).unwrap_or(1.0);
        Ok(StopFunction::Exponential(ExponentialStops {
            property,
            base,
            stops,
            output_type: output_type.clone(),
            default,
        }))
    }
}
